//! Cascade-delete planning.
//!
//! # Responsibility
//! - Compute which containers a cascading delete removes and which items
//!   must be relocated, before anything is committed.
//!
//! # Invariants
//! - Planning is pure: the tree is never mutated.
//! - Every descendant container id appears exactly once.
//! - Items are reported for relocation, never scheduled for deletion.
//! - A missing target aborts the plan; no partial plan is returned.

use crate::model::item::Item;
use crate::model::location::RecordId;
use crate::tree::traverse::{self, Visit};
use crate::tree::{HierarchyTree, NodeKind, TreeNode};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from delete planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletePlanError {
    /// No node with this id exists in the tree snapshot.
    TargetNotFound(RecordId),
    /// The id names an area; areas are not removed by cascade delete.
    TargetIsArea(RecordId),
}

impl Display for DeletePlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetNotFound(id) => write!(f, "container not found: {id}"),
            Self::TargetIsArea(id) => write!(f, "target is an area, not a container: {id}"),
        }
    }
}

impl Error for DeletePlanError {}

/// Node that directly holds the delete target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentInfo {
    pub id: RecordId,
    pub name: String,
    pub kind: NodeKind,
}

impl ParentInfo {
    fn of(node: &TreeNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
        }
    }
}

/// Everything a cascading container delete touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    pub target_id: RecordId,
    pub target_name: String,
    /// Target first, then descendants depth-first.
    pub container_ids_to_delete: Vec<RecordId>,
    pub items_to_move: Vec<Item>,
    /// `None` when the target is top level; its items become unassigned.
    pub parent: Option<ParentInfo>,
}

impl DeletePlan {
    /// Containers removed besides the target itself.
    pub fn sub_container_count(&self) -> usize {
        self.container_ids_to_delete.len().saturating_sub(1)
    }

    /// Nearest surviving ancestor that receives relocated items.
    pub fn relocation_target(&self) -> Option<&str> {
        self.parent.as_ref().map(|parent| parent.id.as_str())
    }

    /// User-facing confirmation text for this plan.
    pub fn confirmation_message(&self) -> String {
        let mut message = format!("Delete container \"{}\"?", self.target_name);
        let subs = self.sub_container_count();
        if subs > 0 {
            message.push_str(&format!(
                "\nThis also deletes {subs} sub-container{}.",
                if subs == 1 { "" } else { "s" }
            ));
        }
        match &self.parent {
            Some(parent) => message.push_str(&format!(
                "\nItems in deleted containers will move to \"{}\".",
                parent.name
            )),
            None => message.push_str("\nItems in deleted containers will become unassigned."),
        }
        message
    }
}

/// Plans the cascading delete of `container_id` against `tree`.
pub fn plan_delete(tree: &HierarchyTree, container_id: &str) -> Result<DeletePlan, DeletePlanError> {
    let target = traverse::find_node(tree.roots(), container_id)
        .ok_or_else(|| DeletePlanError::TargetNotFound(container_id.to_string()))?;
    if target.is_area() {
        return Err(DeletePlanError::TargetIsArea(container_id.to_string()));
    }

    let mut container_ids_to_delete = Vec::new();
    let mut items_to_move = Vec::new();
    traverse::walk_subtree(target, |node, _| {
        container_ids_to_delete.push(node.id.clone());
        items_to_move.extend(node.items.iter().cloned());
        Visit::Continue
    });

    let parent = traverse::find_parent(tree.roots(), container_id).map(ParentInfo::of);

    Ok(DeletePlan {
        target_id: target.id.clone(),
        target_name: target.name.clone(),
        container_ids_to_delete,
        items_to_move,
        parent,
    })
}
