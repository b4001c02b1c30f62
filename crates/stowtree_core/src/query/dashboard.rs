//! Overview statistics over one snapshot.

use crate::model::item::ExpiryStatus;
use crate::service::state::TreeSnapshot;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// Headline numbers for the overview screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub room_count: usize,
    pub container_count: usize,
    /// Distinct item records, not quantities.
    pub item_record_count: usize,
    pub total_quantity: u64,
    pub subcategory_count: usize,
    pub low_stock_count: usize,
    pub expiring_soon_count: usize,
    pub expired_count: usize,
    /// Items fetched but not visible in the tree.
    pub unassigned_count: usize,
}

impl DashboardStats {
    /// Computes stats for `snapshot` relative to `today`.
    pub fn compute(snapshot: &TreeSnapshot, today: NaiveDate) -> Self {
        let mut stats = Self {
            room_count: snapshot.areas().len(),
            container_count: snapshot.containers().len(),
            item_record_count: snapshot.items().len(),
            unassigned_count: snapshot.attach_report().missing_from_tree(),
            ..Self::default()
        };

        let mut subcategories: HashSet<&str> = HashSet::new();
        for item in snapshot.items() {
            stats.total_quantity += u64::from(item.quantity);
            let subcategory = item.subcategory.trim();
            if !subcategory.is_empty() {
                subcategories.insert(subcategory);
            }
            if item.is_low_stock() {
                stats.low_stock_count += 1;
            }
            match item.expiry_status(today) {
                ExpiryStatus::ExpiringSoon { .. } => stats.expiring_soon_count += 1,
                ExpiryStatus::Expired => stats.expired_count += 1,
                ExpiryStatus::NoExpiry | ExpiryStatus::Fresh => {}
            }
        }
        stats.subcategory_count = subcategories.len();
        stats
    }
}
