//! In-memory hierarchy assembled from flat location/item records.
//!
//! # Responsibility
//! - Hold the nested view-model: areas → containers → items.
//! - Provide builder, attacher, traversal and the pure queries over it
//!   (path resolution, aggregation, delete planning).
//!
//! # Invariants
//! - Every node reachable from `roots` has a unique identifier.
//! - An item appears at most once across the whole tree.
//! - Trees are rebuilt wholesale from flat records, never patched in place.

use crate::model::item::Item;
use crate::model::location::{Area, Container, ParentRef, RecordId, AREA_KIND};
use serde::ser::{Error as _, SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::HashMap;

pub mod aggregate;
pub mod attach;
pub mod build;
pub mod delete_plan;
pub mod path;
pub mod traverse;

/// Kind of a hierarchy node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Top-level room.
    Area,
    /// Storage unit at any depth.
    Container,
}

/// Deepest nesting level the JSON export will descend to.
pub const MAX_EXPORT_DEPTH: usize = 256;

/// One node of the assembled hierarchy.
///
/// Drop, clone and equality run on an explicit stack, so arbitrarily deep
/// chains never exhaust the call stack. JSON export stops with an error past
/// [`MAX_EXPORT_DEPTH`].
#[derive(Debug)]
pub struct TreeNode {
    pub id: RecordId,
    pub name: String,
    pub kind: NodeKind,
    /// `room` for areas, the free-text tag for containers.
    pub type_tag: String,
    pub description: Option<String>,
    /// Placement as declared by the source record, even when it did not
    /// resolve and the node was promoted to top level.
    pub declared_parent: Option<ParentRef>,
    pub children: Vec<TreeNode>,
    pub items: Vec<Item>,
}

impl TreeNode {
    /// Creates a childless node for an area.
    pub fn from_area(area: &Area) -> Self {
        Self {
            id: area.id.clone(),
            name: area.name.clone(),
            kind: NodeKind::Area,
            type_tag: AREA_KIND.to_string(),
            description: None,
            declared_parent: None,
            children: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Creates a childless node for a container.
    pub fn from_container(container: &Container) -> Self {
        Self {
            id: container.id.clone(),
            name: container.name.clone(),
            kind: NodeKind::Container,
            type_tag: container.kind.clone(),
            description: container.description.clone(),
            declared_parent: container.parent.clone(),
            children: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn is_area(&self) -> bool {
        self.kind == NodeKind::Area
    }

    fn shallow_copy(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            type_tag: self.type_tag.clone(),
            description: self.description.clone(),
            declared_parent: self.declared_parent.clone(),
            children: Vec::new(),
            items: self.items.clone(),
        }
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.kind == other.kind
            && self.type_tag == other.type_tag
            && self.description == other.description
            && self.declared_parent == other.declared_parent
            && self.items == other.items
            && self.children.len() == other.children.len()
    }
}

impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl Clone for TreeNode {
    fn clone(&self) -> Self {
        // Post-order: a node is copied once all of its children are.
        let mut copies: Vec<TreeNode> = Vec::new();
        let mut stack: Vec<(&TreeNode, bool)> = vec![(self, false)];
        while let Some((node, children_done)) = stack.pop() {
            if children_done {
                let mut copy = node.shallow_copy();
                let first_child = copies.len().saturating_sub(node.children.len());
                copy.children = copies.split_off(first_child);
                copies.push(copy);
            } else {
                stack.push((node, true));
                stack.extend(node.children.iter().rev().map(|child| (child, false)));
            }
        }
        copies.pop().unwrap_or_else(|| self.shallow_copy())
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if !left.same_fields(right) {
                return false;
            }
            pending.extend(left.children.iter().zip(&right.children));
        }
        true
    }
}

impl Eq for TreeNode {}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeExport {
            node: self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

struct NodeExport<'a> {
    node: &'a TreeNode,
    depth: usize,
}

struct ChildrenExport<'a> {
    children: &'a [TreeNode],
    depth: usize,
}

impl Serialize for NodeExport<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.node;
        if self.depth > MAX_EXPORT_DEPTH {
            return Err(S::Error::custom(format!(
                "node {} is nested deeper than {} levels",
                node.id, MAX_EXPORT_DEPTH
            )));
        }
        let mut state = serializer.serialize_struct("TreeNode", 8)?;
        state.serialize_field("id", &node.id)?;
        state.serialize_field("name", &node.name)?;
        state.serialize_field("kind", &node.kind)?;
        state.serialize_field("type", &node.type_tag)?;
        state.serialize_field("description", &node.description)?;
        state.serialize_field("declared_parent", &node.declared_parent)?;
        state.serialize_field(
            "children",
            &ChildrenExport {
                children: &node.children,
                depth: self.depth + 1,
            },
        )?;
        state.serialize_field("items", &node.items)?;
        state.end()
    }
}

impl Serialize for ChildrenExport<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.children.iter().map(|child| NodeExport {
            node: child,
            depth: self.depth,
        }))
    }
}

/// Flat lookup entry for one node, used for direct (non-walking) access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub name: String,
    pub kind: NodeKind,
    pub declared_parent: Option<ParentRef>,
    /// Parent the node actually hangs under; `None` for top-level nodes.
    pub placed_under: Option<RecordId>,
}

/// Data-quality counters collected while building.
///
/// Lenient recovery keeps every record visible; these counters make the
/// recovery observable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildDiagnostics {
    /// Containers whose parent/area reference did not resolve.
    pub orphans_promoted: usize,
    /// Ids of the promoted orphans, in input order.
    pub promoted_ids: Vec<RecordId>,
    /// Records replaced by a later record with the same identifier.
    pub duplicate_ids: usize,
    /// Containers lifted to top level to break a parent cycle.
    pub cycles_broken: usize,
}

impl BuildDiagnostics {
    /// Returns whether the source data needed any recovery.
    pub fn is_clean(&self) -> bool {
        self.orphans_promoted == 0 && self.duplicate_ids == 0 && self.cycles_broken == 0
    }
}

/// Assembled hierarchy plus its flat node index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HierarchyTree {
    roots: Vec<TreeNode>,
    #[serde(skip)]
    index: HashMap<RecordId, NodeSummary>,
    diagnostics: BuildDiagnostics,
}

impl HierarchyTree {
    /// Wraps caller-assembled roots, indexing every reachable node.
    ///
    /// Nodes repeating an already indexed id are left out of the index.
    pub fn from_roots(roots: Vec<TreeNode>) -> Self {
        let mut index = HashMap::new();
        traverse::walk(&roots, |node, ancestors| {
            index.insert(
                node.id.clone(),
                NodeSummary {
                    name: node.name.clone(),
                    kind: node.kind,
                    declared_parent: node.declared_parent.clone(),
                    placed_under: ancestors.last().map(|parent| parent.id.clone()),
                },
            );
            traverse::Visit::Continue
        });
        Self {
            roots,
            index,
            diagnostics: BuildDiagnostics::default(),
        }
    }

    pub(crate) fn from_parts(
        roots: Vec<TreeNode>,
        index: HashMap<RecordId, NodeSummary>,
        diagnostics: BuildDiagnostics,
    ) -> Self {
        Self {
            roots,
            index,
            diagnostics,
        }
    }

    /// Top-level nodes: areas first, then promoted containers.
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub(crate) fn roots_mut(&mut self) -> &mut [TreeNode] {
        &mut self.roots
    }

    pub fn diagnostics(&self) -> &BuildDiagnostics {
        &self.diagnostics
    }

    /// Looks up a node summary without walking the tree.
    pub fn summary(&self, id: &str) -> Option<&NodeSummary> {
        self.index.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of indexed nodes (areas and containers).
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Finds a node by id through a guarded walk.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        traverse::find_node(&self.roots, id)
    }

    /// Top-level area nodes.
    pub fn areas(&self) -> impl Iterator<Item = &TreeNode> {
        self.roots.iter().filter(|node| node.is_area())
    }
}
