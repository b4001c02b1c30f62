//! Item attacher: merges flat items into an assembled tree.
//!
//! # Responsibility
//! - Hang each item under the node its `holder_id` names.
//! - Report items that could not be placed instead of losing them silently.
//!
//! # Invariants
//! - Dedup is by item identity: an id already anywhere in the tree is
//!   never attached again, so attaching is idempotent.
//! - Items without a resolvable holder stay out of the tree and are listed
//!   in the returned report.

use crate::model::item::Item;
use crate::model::location::RecordId;
use crate::tree::traverse::{self, Visit};
use crate::tree::HierarchyTree;
use log::{info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Outcome of one attach pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachReport {
    /// Items appended to a node in this pass.
    pub attached: usize,
    /// Items skipped because their id was already in the tree.
    pub duplicates_skipped: usize,
    /// Items carrying no holder reference at all.
    pub unassigned: Vec<RecordId>,
    /// Items whose holder reference matched no node.
    pub dangling: Vec<RecordId>,
}

impl AttachReport {
    /// Number of distinct items that are not visible in the tree.
    pub fn missing_from_tree(&self) -> usize {
        self.unassigned.len() + self.dangling.len()
    }
}

/// Attaches `items` to their holders inside `tree`.
pub fn attach_items(tree: &mut HierarchyTree, items: &[Item]) -> AttachReport {
    let mut report = AttachReport::default();

    let mut seen: HashSet<String> = HashSet::new();
    traverse::walk(tree.roots(), |node, _| {
        seen.extend(node.items.iter().map(|item| item.id.clone()));
        Visit::Continue
    });

    let mut pending: HashMap<&str, Vec<&Item>> = HashMap::new();
    for item in items {
        if seen.contains(item.id.as_str()) {
            report.duplicates_skipped += 1;
            continue;
        }
        match item.holder_id.as_deref() {
            None => report.unassigned.push(item.id.clone()),
            Some(holder) if tree.contains(holder) => {
                seen.insert(item.id.clone());
                pending.entry(holder).or_default().push(item);
            }
            Some(_) => report.dangling.push(item.id.clone()),
        }
    }

    traverse::for_each_node_mut(tree.roots_mut(), |node| {
        if let Some(batch) = pending.remove(node.id.as_str()) {
            report.attached += batch.len();
            node.items.extend(batch.into_iter().cloned());
        }
    });

    // Indexed but unreachable holders (id clashes) cannot receive items.
    for batch in pending.into_values() {
        report
            .dangling
            .extend(batch.into_iter().map(|item| item.id.clone()));
    }

    if report.dangling.is_empty() {
        info!(
            "event=items_attach module=tree status=ok attached={} duplicates_skipped={} unassigned={}",
            report.attached,
            report.duplicates_skipped,
            report.unassigned.len()
        );
    } else {
        warn!(
            "event=items_attach module=tree status=degraded attached={} duplicates_skipped={} unassigned={} dangling={}",
            report.attached,
            report.duplicates_skipped,
            report.unassigned.len(),
            report.dangling.len()
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::attach_items;
    use crate::model::item::Item;
    use crate::model::location::{Area, Container};
    use crate::tree::build::build_tree;

    #[test]
    fn items_can_hang_directly_under_an_area() {
        let mut tree = build_tree(&[Area::new("r1", "Garage")], &[]);
        let report = attach_items(&mut tree, &[Item::new("i1", "Ladder").held_by("r1")]);
        assert_eq!(report.attached, 1);
        assert_eq!(tree.roots()[0].items[0].name, "Ladder");
    }

    #[test]
    fn same_id_twice_in_one_batch_attaches_once() {
        let mut tree = build_tree(&[], &[Container::new("c1", "Bin")]);
        let items = vec![
            Item::new("i1", "Tape").held_by("c1"),
            Item::new("i1", "Tape (copy)").held_by("c1"),
        ];
        let report = attach_items(&mut tree, &items);
        assert_eq!(report.attached, 1);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(tree.roots()[0].items.len(), 1);
        assert_eq!(tree.roots()[0].items[0].name, "Tape");
    }

    #[test]
    fn unplaceable_items_are_reported() {
        let mut tree = build_tree(&[], &[Container::new("c1", "Bin")]);
        let items = vec![
            Item::new("i1", "Loose"),
            Item::new("i2", "Lost").held_by("gone"),
        ];
        let report = attach_items(&mut tree, &items);
        assert_eq!(report.attached, 0);
        assert_eq!(report.unassigned, vec!["i1".to_string()]);
        assert_eq!(report.dangling, vec!["i2".to_string()]);
        assert_eq!(report.missing_from_tree(), 2);
    }
}
