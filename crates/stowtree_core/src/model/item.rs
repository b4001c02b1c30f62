//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical tracked-item record held by a container or area.
//! - Provide stock and expiry helpers shared by dashboards and tables.
//!
//! # Invariants
//! - `quantity` is never negative (unsigned by construction).
//! - `holder_id` names exactly one direct holder, or none when unassigned.

use crate::model::location::RecordId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Warning window used when an item has an expiry date but no own threshold.
pub const DEFAULT_EXPIRY_WARNING_DAYS: u32 = 30;

/// Tracked inventory object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: RecordId,
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub specification: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub expiry_date: Option<NaiveDate>,
    /// Days before `expiry_date` at which the item counts as expiring.
    pub expiry_warning_days: Option<u32>,
    /// Quantity below which the item counts as low stock.
    pub stock_alert: Option<u32>,
    /// Container or area directly holding this item.
    pub holder_id: Option<RecordId>,
}

/// Expiry state of one item relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// No expiry date recorded.
    NoExpiry,
    /// Expiry is further away than the warning window.
    Fresh,
    /// Expiry falls inside the warning window.
    ExpiringSoon { days_left: i64 },
    /// Expiry day is before the reference day.
    Expired,
}

/// Validation errors for item writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    BlankId,
    BlankName,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "item id must not be blank"),
            Self::BlankName => write!(f, "item name must not be blank"),
        }
    }
}

impl Error for ItemValidationError {}

impl Item {
    /// Creates an unassigned item with zero quantity and empty text fields.
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity: 0,
            unit: String::new(),
            specification: String::new(),
            category: String::new(),
            subcategory: String::new(),
            description: String::new(),
            expiry_date: None,
            expiry_warning_days: None,
            stock_alert: None,
            holder_id: None,
        }
    }

    /// Sets the direct holder (container or area id).
    pub fn held_by(mut self, holder_id: impl Into<RecordId>) -> Self {
        self.holder_id = Some(holder_id.into());
        self
    }

    /// Sets the quantity.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Checks write-side invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.trim().is_empty() {
            return Err(ItemValidationError::BlankId);
        }
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        Ok(())
    }

    /// Returns whether quantity dropped below the configured stock alert.
    ///
    /// Items without a stock alert are never low stock.
    pub fn is_low_stock(&self) -> bool {
        self.stock_alert
            .is_some_and(|threshold| self.quantity < threshold)
    }

    /// Classifies the expiry date against `today`.
    pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
        let Some(expiry) = self.expiry_date else {
            return ExpiryStatus::NoExpiry;
        };
        let days_left = (expiry - today).num_days();
        if days_left < 0 {
            return ExpiryStatus::Expired;
        }
        let window = i64::from(
            self.expiry_warning_days
                .unwrap_or(DEFAULT_EXPIRY_WARNING_DAYS),
        );
        if days_left <= window {
            ExpiryStatus::ExpiringSoon { days_left }
        } else {
            ExpiryStatus::Fresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExpiryStatus, Item, ItemValidationError};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert_eq!(
            Item::new(" ", "Spoon").validate(),
            Err(ItemValidationError::BlankId)
        );
        assert_eq!(
            Item::new("i1", "").validate(),
            Err(ItemValidationError::BlankName)
        );
        assert!(Item::new("i1", "Spoon").validate().is_ok());
    }

    #[test]
    fn low_stock_requires_threshold() {
        let mut item = Item::new("i1", "Gloves").with_quantity(2);
        assert!(!item.is_low_stock());

        item.stock_alert = Some(3);
        assert!(item.is_low_stock());

        item.quantity = 3;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn expiry_status_uses_item_window_or_default() {
        let today = day(2026, 3, 1);
        let mut item = Item::new("i1", "Ethanol");
        assert_eq!(item.expiry_status(today), ExpiryStatus::NoExpiry);

        item.expiry_date = Some(day(2026, 3, 20));
        assert_eq!(
            item.expiry_status(today),
            ExpiryStatus::ExpiringSoon { days_left: 19 }
        );

        item.expiry_warning_days = Some(7);
        assert_eq!(item.expiry_status(today), ExpiryStatus::Fresh);

        item.expiry_date = Some(day(2026, 2, 28));
        assert_eq!(item.expiry_status(today), ExpiryStatus::Expired);
    }
}
