//! Derived counts over a subtree.
//!
//! # Invariants
//! - Every function accepts a missing node and returns zero/empty.
//! - Counting goes through the shared traversal, so each node id counts once.

use crate::model::item::Item;
use crate::model::location::RecordId;
use crate::tree::traverse::{self, Visit};
use crate::tree::TreeNode;
use serde::Serialize;

/// Items held by `node` plus every descendant container.
pub fn total_items(node: Option<&TreeNode>) -> usize {
    let Some(node) = node else {
        return 0;
    };
    let mut total = 0;
    traverse::walk_subtree(node, |current, _| {
        total += current.items.len();
        Visit::Continue
    });
    total
}

/// Immediate child containers of `node`.
pub fn direct_sub_container_count(node: Option<&TreeNode>) -> usize {
    node.map_or(0, |node| node.children.len())
}

/// All containers below `node`, at any depth.
pub fn total_sub_containers(node: Option<&TreeNode>) -> usize {
    let Some(node) = node else {
        return 0;
    };
    let mut visited_nodes = 0;
    traverse::walk_subtree(node, |_, _| {
        visited_nodes += 1;
        Visit::Continue
    });
    visited_nodes - 1
}

/// Sum of item quantities in the subtree.
pub fn total_quantity(node: Option<&TreeNode>) -> u64 {
    collect_all_items(node)
        .iter()
        .map(|located| u64::from(located.item.quantity))
        .sum()
}

/// Item tagged with the node that directly holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedItem {
    pub item: Item,
    pub holder_id: RecordId,
    pub holder_name: String,
}

/// Every item in the subtree exactly once, in walk order.
pub fn collect_all_items(node: Option<&TreeNode>) -> Vec<LocatedItem> {
    let Some(node) = node else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    let mut located = Vec::new();
    traverse::walk_subtree(node, |current, _| {
        for item in &current.items {
            if seen.insert(item.id.as_str()) {
                located.push(LocatedItem {
                    item: item.clone(),
                    holder_id: current.id.clone(),
                    holder_name: current.name.clone(),
                });
            }
        }
        Visit::Continue
    });
    located
}

#[cfg(test)]
mod tests {
    use super::{
        collect_all_items, direct_sub_container_count, total_items, total_quantity,
        total_sub_containers,
    };
    use crate::model::item::Item;
    use crate::model::location::Container;
    use crate::tree::TreeNode;

    fn container(id: &str, children: Vec<TreeNode>, items: Vec<Item>) -> TreeNode {
        let mut node = TreeNode::from_container(&Container::new(id, id));
        node.children = children;
        node.items = items;
        node
    }

    #[test]
    fn missing_node_counts_zero() {
        assert_eq!(total_items(None), 0);
        assert_eq!(direct_sub_container_count(None), 0);
        assert_eq!(total_sub_containers(None), 0);
        assert_eq!(total_quantity(None), 0);
        assert!(collect_all_items(None).is_empty());
    }

    #[test]
    fn chain_counts_nested_containers() {
        let c = container("c", vec![], vec![]);
        let b = container("b", vec![c], vec![]);
        let a = container("a", vec![b], vec![]);

        assert_eq!(total_sub_containers(Some(&a)), 2);
        assert_eq!(total_sub_containers(Some(&a.children[0])), 1);
        assert_eq!(total_sub_containers(Some(&a.children[0].children[0])), 0);
        assert_eq!(direct_sub_container_count(Some(&a)), 1);
    }

    #[test]
    fn items_and_quantities_sum_over_descendants() {
        let drawer = container(
            "drawer",
            vec![],
            vec![Item::new("i2", "Fork").with_quantity(4)],
        );
        let cabinet = container(
            "cabinet",
            vec![drawer],
            vec![Item::new("i1", "Plate").with_quantity(6)],
        );

        assert_eq!(total_items(Some(&cabinet)), 2);
        assert_eq!(total_quantity(Some(&cabinet)), 10);

        let located = collect_all_items(Some(&cabinet));
        assert_eq!(located.len(), 2);
        assert_eq!(located[1].holder_id, "drawer");
        assert_eq!(located[1].item.name, "Fork");
    }

    #[test]
    fn leaf_without_items_is_zero() {
        let leaf = container("leaf", vec![], vec![]);
        assert_eq!(total_items(Some(&leaf)), 0);
    }
}
