//! Storage use-case service.
//!
//! # Responsibility
//! - Bind one record source to the application state and location cache.
//! - Provide refresh, delete planning/commit and location lookups.
//!
//! # Invariants
//! - Deletes are planned against the current snapshot before committing.
//! - A failed commit leaves the snapshot untouched.
//! - The location cache is cleared on every refresh.

use crate::model::location::RecordId;
use crate::source::{RecordSource, SourceError};
use crate::service::location::LocationResolver;
use crate::service::state::{InventoryState, TreeEvent, TreeSnapshot};
use crate::tree::delete_plan::{plan_delete, DeletePlan, DeletePlanError};
use crate::tree::path::PathResolution;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Errors from storage service operations.
#[derive(Debug)]
pub enum StorageServiceError {
    /// Delete target missing or not a container.
    Plan(DeletePlanError),
    /// Source failed to commit.
    Source(SourceError),
}

impl Display for StorageServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan(err) => write!(f, "{err}"),
            Self::Source(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Plan(err) => Some(err),
            Self::Source(err) => Some(err),
        }
    }
}

impl From<DeletePlanError> for StorageServiceError {
    fn from(value: DeletePlanError) -> Self {
        Self::Plan(value)
    }
}

impl From<SourceError> for StorageServiceError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

/// Storage service facade.
pub struct StorageService<S: RecordSource> {
    source: S,
    state: InventoryState,
    locations: LocationResolver,
}

impl<S: RecordSource> StorageService<S> {
    /// Creates a service with an empty snapshot; call `refresh` to load.
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: InventoryState::new(),
            locations: LocationResolver::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> Arc<TreeSnapshot> {
        self.state.snapshot()
    }

    pub fn subscribe(&mut self) -> Receiver<TreeEvent> {
        self.state.subscribe()
    }

    /// Rebuilds the tree from the source.
    pub fn refresh(&mut self) -> Arc<TreeSnapshot> {
        self.locations.clear();
        self.state.refresh(&self.source)
    }

    /// Plans a cascade delete against the current snapshot.
    pub fn plan_delete(&self, container_id: &str) -> Result<DeletePlan, StorageServiceError> {
        Ok(plan_delete(self.state.snapshot().tree(), container_id)?)
    }

    /// Plans, commits and refreshes; returns the committed plan.
    pub fn delete_container(
        &mut self,
        container_id: &str,
    ) -> Result<DeletePlan, StorageServiceError> {
        let plan = self.plan_delete(container_id)?;
        if let Err(err) = self.source.delete_containers(&plan.container_ids_to_delete) {
            error!(
                "event=container_delete module=service status=error target_id={} error={}",
                container_id, err
            );
            return Err(err.into());
        }
        info!(
            "event=container_delete module=service status=ok target_id={} containers={} items_moved={}",
            container_id,
            plan.container_ids_to_delete.len(),
            plan.items_to_move.len()
        );
        self.refresh();
        Ok(plan)
    }

    /// Resolves the breadcrumb of a node id.
    pub fn resolve_location(&mut self, id: &str) -> PathResolution {
        let snapshot = self.state.snapshot();
        self.locations.resolve(snapshot.tree(), &self.source, id)
    }

    /// Breadcrumb rendered as one string, or the unknown-location placeholder.
    pub fn location_label(&mut self, id: &str, separator: &str) -> String {
        self.resolve_location(id).display_or_placeholder(separator)
    }

    /// Resolves where an item is stored.
    pub fn item_location(&mut self, item_id: &str) -> PathResolution {
        let snapshot = self.state.snapshot();
        let holder: Option<RecordId> = snapshot
            .items()
            .iter()
            .find(|item| item.id == item_id)
            .and_then(|item| item.holder_id.clone());
        match holder {
            Some(holder_id) => self.resolve_location(&holder_id),
            None => PathResolution::NotFound,
        }
    }
}
