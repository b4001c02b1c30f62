//! Shared cycle-safe traversal over the hierarchy.
//!
//! # Responsibility
//! - Provide the single depth-first walker used by path resolution,
//!   aggregation, item attachment and delete planning.
//!
//! # Invariants
//! - A node id is visited at most once per visited-set, so repeated or
//!   cyclic ids can never hang a walk.
//! - Walks are iterative; depth is bounded by memory, not the call stack.

use crate::tree::TreeNode;
use std::collections::HashSet;

/// Visited-set shared across one or more walks.
pub type Visited<'t> = HashSet<&'t str>;

/// Visitor decision after seeing one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into children.
    Continue,
    /// Do not descend below this node.
    SkipChildren,
    /// End the walk immediately.
    Stop,
}

/// Walks `roots` pre-order with a fresh visited-set.
///
/// The visitor receives the node and its ancestor chain (root first).
pub fn walk<'t, F>(roots: &'t [TreeNode], visitor: F)
where
    F: FnMut(&'t TreeNode, &[&'t TreeNode]) -> Visit,
{
    let mut visited = Visited::new();
    walk_with(roots, &mut visited, visitor);
}

/// Walks `roots` pre-order, skipping ids already present in `visited`.
///
/// Returns `true` when the visitor stopped the walk early.
pub fn walk_with<'t, F>(roots: &'t [TreeNode], visited: &mut Visited<'t>, mut visitor: F) -> bool
where
    F: FnMut(&'t TreeNode, &[&'t TreeNode]) -> Visit,
{
    let mut stack: Vec<(&'t TreeNode, usize)> = roots.iter().rev().map(|node| (node, 0)).collect();
    let mut ancestors: Vec<&'t TreeNode> = Vec::new();

    while let Some((node, depth)) = stack.pop() {
        ancestors.truncate(depth);
        if !visited.insert(node.id.as_str()) {
            continue;
        }

        match visitor(node, &ancestors) {
            Visit::Stop => return true,
            Visit::SkipChildren => continue,
            Visit::Continue => {}
        }

        ancestors.push(node);
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    false
}

/// Visits every node mutably, once per id.
pub fn for_each_node_mut<F>(roots: &mut [TreeNode], mut visitor: F)
where
    F: FnMut(&mut TreeNode),
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<&mut TreeNode> = roots.iter_mut().rev().collect();

    while let Some(node) = stack.pop() {
        if !visited.insert(node.id.clone()) {
            continue;
        }
        visitor(&mut *node);
        stack.extend(node.children.iter_mut().rev());
    }
}

/// Finds the first node with `id`.
pub fn find_node<'t>(roots: &'t [TreeNode], id: &str) -> Option<&'t TreeNode> {
    let mut found = None;
    walk(roots, |node, _| {
        if node.id == id {
            found = Some(node);
            return Visit::Stop;
        }
        Visit::Continue
    });
    found
}

/// Returns the chain root → ... → node for `id`, inclusive.
pub fn path_to<'t>(roots: &'t [TreeNode], id: &str) -> Option<Vec<&'t TreeNode>> {
    let mut found = None;
    walk(roots, |node, ancestors| {
        if node.id == id {
            let mut chain = ancestors.to_vec();
            chain.push(node);
            found = Some(chain);
            return Visit::Stop;
        }
        Visit::Continue
    });
    found
}

/// Finds the node whose direct children include `child_id`.
pub fn find_parent<'t>(roots: &'t [TreeNode], child_id: &str) -> Option<&'t TreeNode> {
    let mut found = None;
    walk(roots, |node, _| {
        if node.children.iter().any(|child| child.id == child_id) {
            found = Some(node);
            return Visit::Stop;
        }
        Visit::Continue
    });
    found
}

/// Walks the subtree rooted at `node`, the node itself included.
pub fn walk_subtree<'t, F>(node: &'t TreeNode, visitor: F)
where
    F: FnMut(&'t TreeNode, &[&'t TreeNode]) -> Visit,
{
    walk(std::slice::from_ref(node), visitor);
}
