//! Breadcrumb path resolution.
//!
//! # Responsibility
//! - Compute the root-to-target trail of `{id, name}` segments.
//! - Degrade to a two-level `parent-target` trail when the tree walk
//!   misses but the parent is directly known.
//!
//! # Invariants
//! - Resolution never fails loudly: misses return `PathResolution::NotFound`.
//! - `OVERVIEW_ID` always resolves to the single overview segment.
//! - Walks are cycle-safe (shared traversal visited-set).

use crate::model::location::{Container, ParentRef, RecordId};
use crate::tree::traverse;
use crate::tree::{HierarchyTree, NodeSummary, TreeNode};
use serde::Serialize;

/// Pseudo-identifier of the root overview.
pub const OVERVIEW_ID: &str = "overview";
/// Display name of the root overview.
pub const OVERVIEW_NAME: &str = "Overview";
/// Separator used when a path is rendered as one string.
pub const DEFAULT_PATH_SEPARATOR: &str = "-";
/// Placeholder shown when a location cannot be resolved.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// One breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSegment {
    pub id: RecordId,
    pub name: String,
}

impl PathSegment {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Segment representing the root overview.
    pub fn overview() -> Self {
        Self::new(OVERVIEW_ID, OVERVIEW_NAME)
    }

    fn of(node: &TreeNode) -> Self {
        Self::new(node.id.clone(), node.name.clone())
    }
}

/// Result of resolving a breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "segments", rename_all = "snake_case")]
pub enum PathResolution {
    /// Full trail from a root to the target, inclusive.
    Found(Vec<PathSegment>),
    /// Two-level `parent, target` trail built from direct parent lookup.
    Degraded(Vec<PathSegment>),
    /// Neither the walk nor the fallback located the target.
    NotFound,
}

impl PathResolution {
    /// Segments of a resolved path; empty for `NotFound`.
    pub fn segments(&self) -> &[PathSegment] {
        match self {
            Self::Found(segments) | Self::Degraded(segments) => segments,
            Self::NotFound => &[],
        }
    }

    /// Segment names in order.
    pub fn names(&self) -> Vec<&str> {
        self.segments()
            .iter()
            .map(|segment| segment.name.as_str())
            .collect()
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Joins the segment names, or `None` when unresolved.
    pub fn display(&self, separator: &str) -> Option<String> {
        if !self.is_resolved() {
            return None;
        }
        Some(self.names().join(separator))
    }

    /// Joins the segment names, falling back to [`UNKNOWN_LOCATION`].
    pub fn display_or_placeholder(&self, separator: &str) -> String {
        self.display(separator)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }
}

/// Resolves the breadcrumb for `target_id` within `tree`.
pub fn resolve_path(tree: &HierarchyTree, target_id: &str) -> PathResolution {
    if target_id == OVERVIEW_ID {
        return PathResolution::Found(vec![PathSegment::overview()]);
    }

    if let Some(chain) = traverse::path_to(tree.roots(), target_id) {
        return PathResolution::Found(chain.into_iter().map(PathSegment::of).collect());
    }

    match tree.summary(target_id) {
        Some(summary) => degrade(tree, target_id, summary),
        None => PathResolution::NotFound,
    }
}

/// Resolves a container record that may be missing from `tree`.
///
/// Used for records fetched on demand: the tree walk is tried first, then
/// the record's own parent reference is looked up directly.
pub fn resolve_detached(tree: &HierarchyTree, container: &Container) -> PathResolution {
    let resolution = resolve_path(tree, &container.id);
    if resolution.is_resolved() {
        return resolution;
    }
    match &container.parent {
        Some(parent) => degraded_pair(tree, parent, &container.id, &container.name),
        None => PathResolution::NotFound,
    }
}

fn degrade(tree: &HierarchyTree, target_id: &str, summary: &NodeSummary) -> PathResolution {
    match &summary.declared_parent {
        Some(parent) => degraded_pair(tree, parent, target_id, &summary.name),
        None => PathResolution::NotFound,
    }
}

fn degraded_pair(
    tree: &HierarchyTree,
    parent: &ParentRef,
    target_id: &str,
    target_name: &str,
) -> PathResolution {
    match tree.summary(parent.id()) {
        Some(parent_summary) => PathResolution::Degraded(vec![
            PathSegment::new(parent.id(), parent_summary.name.clone()),
            PathSegment::new(target_id, target_name),
        ]),
        None => PathResolution::NotFound,
    }
}
