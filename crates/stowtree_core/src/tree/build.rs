//! Hierarchy builder: flat areas + containers → nested tree.
//!
//! # Responsibility
//! - Index containers by id and hang each one under its resolved parent.
//! - Recover from dangling references, duplicate ids and parent cycles
//!   without dropping any record.
//!
//! # Invariants
//! - Caller collections are never reused; every node is a fresh copy.
//! - Resolution priority: `parentId` (container index), then `areaId`
//!   (area index), otherwise top level.
//! - Duplicate ids keep the first position and the last record's values.
//! - Every input container appears in the output exactly once.

use crate::model::location::{Area, Container, ParentRef, RecordId};
use crate::tree::{BuildDiagnostics, HierarchyTree, NodeSummary, TreeNode};
use log::{info, warn};
use std::collections::HashMap;

trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Area {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for Container {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

/// Builds the hierarchy from flat area and container records.
///
/// Output roots are ordered: areas (input order) with their subtrees, then
/// top-level containers (unplaced or promoted orphans, input order), then
/// containers lifted out of parent cycles.
pub fn build_tree(areas: &[Area], containers: &[Container]) -> HierarchyTree {
    let mut diagnostics = BuildDiagnostics::default();
    let areas = dedup_last_write_wins(areas, &mut diagnostics.duplicate_ids);
    let containers = dedup_last_write_wins(containers, &mut diagnostics.duplicate_ids);

    let area_slots: HashMap<&str, usize> = areas
        .iter()
        .enumerate()
        .map(|(slot, area)| (area.id.as_str(), slot))
        .collect();
    let container_slots: HashMap<&str, usize> = containers
        .iter()
        .enumerate()
        .map(|(slot, container)| (container.id.as_str(), slot))
        .collect();

    let mut area_children: Vec<Vec<usize>> = vec![Vec::new(); areas.len()];
    let mut container_children: Vec<Vec<usize>> = vec![Vec::new(); containers.len()];
    let mut top_level: Vec<usize> = Vec::new();

    for (slot, container) in containers.iter().enumerate() {
        let target = match &container.parent {
            Some(ParentRef::Container(parent_id)) => match container_slots.get(parent_id.as_str()) {
                Some(&parent) => Some(&mut container_children[parent]),
                None => None,
            },
            Some(ParentRef::Area(area_id)) => match area_slots.get(area_id.as_str()) {
                Some(&area) => Some(&mut area_children[area]),
                None => None,
            },
            None => Some(&mut top_level),
        };

        match target {
            Some(siblings) => siblings.push(slot),
            None => {
                let missing = container.parent.as_ref().map_or("", ParentRef::id);
                warn!(
                    "event=tree_orphan_promoted module=tree status=degraded container_id={} missing_parent={}",
                    container.id, missing
                );
                diagnostics.orphans_promoted += 1;
                diagnostics.promoted_ids.push(container.id.clone());
                top_level.push(slot);
            }
        }
    }

    let mut assembler = Assembler {
        containers: &containers,
        children: &container_children,
        placed: vec![false; containers.len()],
        index: HashMap::with_capacity(areas.len() + containers.len()),
        duplicate_ids: 0,
    };

    let mut roots = Vec::with_capacity(areas.len() + top_level.len());
    for (slot, area) in areas.iter().enumerate() {
        let mut node = TreeNode::from_area(area);
        assembler.index_node(&node, None);
        node.children = area_children[slot]
            .iter()
            .filter_map(|&child| assembler.materialize(child, Some(&area.id)))
            .collect();
        roots.push(node);
    }

    for slot in top_level {
        if let Some(node) = assembler.materialize(slot, None) {
            roots.push(node);
        }
    }

    // Anything still unplaced only hangs off other unplaced containers:
    // a parent cycle. Lift its first member to top level.
    for slot in 0..containers.len() {
        if assembler.placed[slot] {
            continue;
        }
        warn!(
            "event=tree_cycle_broken module=tree status=degraded container_id={}",
            containers[slot].id
        );
        diagnostics.cycles_broken += 1;
        if let Some(node) = assembler.materialize(slot, None) {
            roots.push(node);
        }
    }

    diagnostics.duplicate_ids += assembler.duplicate_ids;
    let index = assembler.index;

    if diagnostics.is_clean() {
        info!(
            "event=tree_build module=tree status=ok areas={} containers={} roots={}",
            areas.len(),
            containers.len(),
            roots.len()
        );
    } else {
        warn!(
            "event=tree_build module=tree status=degraded areas={} containers={} roots={} orphans_promoted={} duplicate_ids={} cycles_broken={}",
            areas.len(),
            containers.len(),
            roots.len(),
            diagnostics.orphans_promoted,
            diagnostics.duplicate_ids,
            diagnostics.cycles_broken
        );
    }

    HierarchyTree::from_parts(roots, index, diagnostics)
}

struct Assembler<'a> {
    containers: &'a [&'a Container],
    children: &'a [Vec<usize>],
    placed: Vec<bool>,
    index: HashMap<RecordId, NodeSummary>,
    duplicate_ids: usize,
}

struct Frame<'a> {
    node: TreeNode,
    pending: std::slice::Iter<'a, usize>,
}

impl<'a> Assembler<'a> {
    /// Places `slot` and everything below it, depth-first on an explicit stack.
    fn materialize(&mut self, slot: usize, placed_under: Option<&RecordId>) -> Option<TreeNode> {
        if self.placed[slot] {
            return None;
        }
        let children_by_slot: &'a [Vec<usize>] = self.children;
        let root = self.open(slot, placed_under.cloned());
        let mut stack = vec![Frame {
            node: root,
            pending: children_by_slot[slot].iter(),
        }];

        loop {
            let frame = stack.last_mut()?;
            match frame.pending.next() {
                Some(&child) if self.placed[child] => {}
                Some(&child) => {
                    let parent_id = frame.node.id.clone();
                    let node = self.open(child, Some(parent_id));
                    stack.push(Frame {
                        node,
                        pending: children_by_slot[child].iter(),
                    });
                }
                None => {
                    let finished = stack.pop()?.node;
                    match stack.last_mut() {
                        Some(parent) => parent.node.children.push(finished),
                        None => return Some(finished),
                    }
                }
            }
        }
    }

    fn open(&mut self, slot: usize, placed_under: Option<RecordId>) -> TreeNode {
        self.placed[slot] = true;
        let node = TreeNode::from_container(self.containers[slot]);
        self.index_node(&node, placed_under);
        node
    }

    fn index_node(&mut self, node: &TreeNode, placed_under: Option<RecordId>) {
        // Areas and containers share one lookup; an area keeps a clashing id.
        if self.index.contains_key(node.id.as_str()) {
            self.duplicate_ids += 1;
            return;
        }
        self.index.insert(
            node.id.clone(),
            NodeSummary {
                name: node.name.clone(),
                kind: node.kind,
                declared_parent: node.declared_parent.clone(),
                placed_under,
            },
        );
    }
}

fn dedup_last_write_wins<'a, T: Keyed>(records: &'a [T], duplicates: &mut usize) -> Vec<&'a T> {
    let mut slots: HashMap<&'a str, usize> = HashMap::with_capacity(records.len());
    let mut kept: Vec<&'a T> = Vec::with_capacity(records.len());
    for record in records {
        match slots.get(record.key()) {
            Some(&slot) => {
                kept[slot] = record;
                *duplicates += 1;
            }
            None => {
                slots.insert(record.key(), kept.len());
                kept.push(record);
            }
        }
    }
    kept
}
