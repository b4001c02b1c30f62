//! Core domain logic for stowtree.
//! This crate is the single source of truth for hierarchy invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod service;
pub mod source;
pub mod tree;
pub mod wire;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::item::{ExpiryStatus, Item, ItemValidationError};
pub use model::location::{Area, Container, ParentRef, RecordId};
pub use query::dashboard::DashboardStats;
pub use query::materials::{materials_by_subcategory, search_items, MaterialGroup};
pub use service::state::{InventoryState, RecordSlice, RefreshNotice, TreeEvent, TreeSnapshot};
pub use service::storage_service::{StorageService, StorageServiceError};
pub use source::{RecordSource, RestRecordSource, SourceError, SourceResult, SqliteRecordSource};
pub use tree::aggregate::{
    collect_all_items, direct_sub_container_count, total_items, total_quantity,
    total_sub_containers, LocatedItem,
};
pub use tree::attach::{attach_items, AttachReport};
pub use tree::build::build_tree;
pub use tree::delete_plan::{plan_delete, DeletePlan, DeletePlanError, ParentInfo};
pub use tree::path::{resolve_path, PathResolution, PathSegment, OVERVIEW_ID};
pub use tree::{BuildDiagnostics, HierarchyTree, NodeKind, TreeNode, MAX_EXPORT_DEPTH};
pub use wire::{DecodedList, RejectedRecord, WireError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
