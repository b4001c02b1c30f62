//! Application state: the current tree snapshot and its subscribers.
//!
//! # Responsibility
//! - Rebuild the hierarchy wholesale from a record source.
//! - Publish each rebuilt snapshot and notify subscribers.
//!
//! # Invariants
//! - Snapshots are immutable once published; readers hold an `Arc`.
//! - `refresh` takes `&mut self`, so two refreshes never interleave.
//! - A failing slice degrades to empty and is reported as a notice; the
//!   other slices still build.
//! - Records a source rejected individually are reported as a notice too.
//! - `generation` increases by one per completed refresh.

use crate::model::item::Item;
use crate::model::location::{Area, Container};
use crate::source::RecordSource;
use crate::tree::attach::{attach_items, AttachReport};
use crate::tree::build::build_tree;
use crate::tree::HierarchyTree;
use crate::wire::DecodedList;
use log::{info, warn};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

/// Flat record collection fetched during refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSlice {
    Areas,
    Containers,
    Items,
}

impl RecordSlice {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Areas => "areas",
            Self::Containers => "containers",
            Self::Items => "items",
        }
    }
}

impl Display for RecordSlice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal problem observed during a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshNotice {
    pub slice: RecordSlice,
    pub message: String,
}

/// Notification sent after every completed rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    TreeChanged { generation: u64 },
}

/// One immutable rebuild result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeSnapshot {
    generation: u64,
    tree: HierarchyTree,
    areas: Vec<Area>,
    containers: Vec<Container>,
    items: Vec<Item>,
    attach_report: AttachReport,
    notices: Vec<RefreshNotice>,
}

impl TreeSnapshot {
    /// Builds the tree from flat records and attaches items.
    pub fn assemble(
        generation: u64,
        areas: Vec<Area>,
        containers: Vec<Container>,
        items: Vec<Item>,
        notices: Vec<RefreshNotice>,
    ) -> Self {
        let mut tree = build_tree(&areas, &containers);
        let attach_report = attach_items(&mut tree, &items);
        Self {
            generation,
            tree,
            areas,
            containers,
            items,
            attach_report,
            notices,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tree(&self) -> &HierarchyTree {
        &self.tree
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Every fetched item, including ones not visible in the tree.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn attach_report(&self) -> &AttachReport {
        &self.attach_report
    }

    pub fn notices(&self) -> &[RefreshNotice] {
        &self.notices
    }

    /// Whether every slice was fetched successfully.
    pub fn is_complete(&self) -> bool {
        self.notices.is_empty()
    }
}

/// Owner of the current snapshot.
#[derive(Default)]
pub struct InventoryState {
    snapshot: Arc<TreeSnapshot>,
    subscribers: Vec<Sender<TreeEvent>>,
}

impl InventoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot; generation 0 before the first refresh.
    pub fn snapshot(&self) -> Arc<TreeSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    /// Registers a receiver for `TreeChanged` events.
    pub fn subscribe(&mut self) -> Receiver<TreeEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Number of subscribers still alive after the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Fetches all slices, rebuilds and publishes a new snapshot.
    pub fn refresh<S: RecordSource + ?Sized>(&mut self, source: &S) -> Arc<TreeSnapshot> {
        let started_at = Instant::now();
        let mut notices = Vec::new();

        let areas = fetch_slice(
            RecordSlice::Areas,
            || source.fetch_areas().map(DecodedList::complete),
            &mut notices,
        );
        let containers = fetch_slice(
            RecordSlice::Containers,
            || source.fetch_containers().map(DecodedList::complete),
            &mut notices,
        );
        let items = fetch_slice(RecordSlice::Items, || source.fetch_items(), &mut notices);

        let generation = self.snapshot.generation + 1;
        let snapshot = TreeSnapshot::assemble(generation, areas, containers, items, notices);

        if snapshot.is_complete() {
            info!(
                "event=tree_refresh module=state status=ok generation={} nodes={} items={} duration_ms={}",
                generation,
                snapshot.tree.node_count(),
                snapshot.items.len(),
                started_at.elapsed().as_millis()
            );
        } else {
            warn!(
                "event=tree_refresh module=state status=degraded generation={} nodes={} items={} failed_slices={} duration_ms={}",
                generation,
                snapshot.tree.node_count(),
                snapshot.items.len(),
                snapshot.notices.len(),
                started_at.elapsed().as_millis()
            );
        }

        self.snapshot = Arc::new(snapshot);
        self.publish(TreeEvent::TreeChanged { generation });
        self.snapshot()
    }

    fn publish(&mut self, event: TreeEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event).is_ok());
    }
}

fn fetch_slice<T, E, F>(slice: RecordSlice, fetch: F, notices: &mut Vec<RefreshNotice>) -> Vec<T>
where
    E: Display,
    F: FnOnce() -> Result<DecodedList<T>, E>,
{
    match fetch() {
        Ok(list) if list.is_complete() => {
            info!(
                "event=tree_refresh module=state status=ok slice={} records={}",
                slice,
                list.records.len()
            );
            list.records
        }
        Ok(list) => {
            warn!(
                "event=tree_refresh module=state status=degraded slice={} records={} rejected={}",
                slice,
                list.records.len(),
                list.rejected.len()
            );
            let reasons: Vec<String> = list.rejected.iter().map(ToString::to_string).collect();
            notices.push(RefreshNotice {
                slice,
                message: format!(
                    "skipped {} malformed record(s): {}",
                    list.rejected.len(),
                    reasons.join("; ")
                ),
            });
            list.records
        }
        Err(err) => {
            warn!(
                "event=tree_refresh module=state status=degraded slice={} error={}",
                slice, err
            );
            notices.push(RefreshNotice {
                slice,
                message: err.to_string(),
            });
            Vec::new()
        }
    }
}
