//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple: every call returns an envelope.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every DB-backed call works on a freshly refreshed snapshot.

use chrono::Local;
use stowtree_core::db::open_db;
use stowtree_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, DashboardStats, PathResolution, SqliteRecordSource, StorageService,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const PATH_SEPARATOR: &str = "-";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Serialized hierarchy plus refresh diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryTreeResponse {
    pub ok: bool,
    /// JSON of the assembled tree (`roots`, `diagnostics`).
    pub tree_json: String,
    pub generation: u64,
    /// One message per slice that failed to load.
    pub notices: Vec<String>,
    pub message: String,
}

/// Breadcrumb for one node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationResponse {
    /// `found`, `degraded` or `not_found`.
    pub status: String,
    pub segment_ids: Vec<String>,
    pub segment_names: Vec<String>,
    /// Joined names, or the unknown-location placeholder.
    pub label: String,
    pub message: String,
}

/// Cascade-delete preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlanResponse {
    pub ok: bool,
    pub container_ids: Vec<String>,
    pub sub_container_count: u32,
    pub items_to_move: u32,
    /// Receiving node id; `None` means items become unassigned.
    pub relocation_target: Option<String>,
    pub confirmation: String,
    pub message: String,
}

impl DeletePlanResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            container_ids: Vec::new(),
            sub_container_count: 0,
            items_to_move: 0,
            relocation_target: None,
            confirmation: String::new(),
            message: message.into(),
        }
    }
}

/// Overview statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardResponse {
    pub ok: bool,
    pub room_count: u32,
    pub container_count: u32,
    pub item_record_count: u32,
    pub total_quantity: u64,
    pub subcategory_count: u32,
    pub low_stock_count: u32,
    pub expiring_soon_count: u32,
    pub expired_count: u32,
    pub unassigned_count: u32,
    pub message: String,
}

/// Returns the refreshed hierarchy as JSON.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn inventory_tree() -> InventoryTreeResponse {
    let result = with_storage_service(|service| {
        let snapshot = service.refresh();
        let tree_json = serde_json::to_string(snapshot.tree())
            .map_err(|err| format!("tree encode failed: {err}"))?;
        Ok(InventoryTreeResponse {
            ok: true,
            tree_json,
            generation: snapshot.generation(),
            notices: snapshot
                .notices()
                .iter()
                .map(|notice| format!("{}: {}", notice.slice, notice.message))
                .collect(),
            message: format!("{} node(s) loaded.", snapshot.tree().node_count()),
        })
    });
    result.unwrap_or_else(|err| InventoryTreeResponse {
        ok: false,
        tree_json: String::new(),
        generation: 0,
        notices: Vec::new(),
        message: format!("inventory_tree failed: {err}"),
    })
}

/// Resolves the breadcrumb of a container or area id.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; unresolvable ids return `not_found` with a placeholder label.
#[flutter_rust_bridge::frb(sync)]
pub fn resolve_location(node_id: String) -> LocationResponse {
    let node_id = node_id.trim().to_string();
    match with_storage_service(|service| {
        service.refresh();
        Ok(service.resolve_location(&node_id))
    }) {
        Ok(resolution) => to_location_response(&resolution),
        Err(err) => {
            let mut response = to_location_response(&PathResolution::NotFound);
            response.message = format!("resolve_location failed: {err}");
            response
        }
    }
}

/// Previews the cascade delete of one container.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_container_delete(container_id: String) -> DeletePlanResponse {
    let container_id = container_id.trim().to_string();
    let result = with_storage_service(|service| {
        service.refresh();
        service
            .plan_delete(&container_id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(plan) => DeletePlanResponse {
            ok: true,
            sub_container_count: count(plan.sub_container_count()),
            items_to_move: count(plan.items_to_move.len()),
            relocation_target: plan.relocation_target().map(str::to_string),
            confirmation: plan.confirmation_message(),
            message: format!(
                "{} container(s) will be deleted.",
                plan.container_ids_to_delete.len()
            ),
            container_ids: plan.container_ids_to_delete,
        },
        Err(err) => DeletePlanResponse::failure(format!("plan_container_delete failed: {err}")),
    }
}

/// Commits the cascade delete of one container.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Items are relocated, never deleted.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_container(container_id: String) -> ActionResponse {
    let container_id = container_id.trim().to_string();
    let result = with_storage_service(|service| {
        service.refresh();
        service
            .delete_container(&container_id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(plan) => ActionResponse {
            ok: true,
            message: format!(
                "Deleted {} container(s); moved {} item(s).",
                plan.container_ids_to_delete.len(),
                plan.items_to_move.len()
            ),
        },
        Err(err) => ActionResponse {
            ok: false,
            message: format!("delete_container failed: {err}"),
        },
    }
}

/// Computes overview statistics for today (local time).
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_stats() -> DashboardResponse {
    let today = Local::now().date_naive();
    match with_storage_service(|service| Ok(DashboardStats::compute(&service.refresh(), today)))
    {
        Ok(stats) => DashboardResponse {
            ok: true,
            room_count: count(stats.room_count),
            container_count: count(stats.container_count),
            item_record_count: count(stats.item_record_count),
            total_quantity: stats.total_quantity,
            subcategory_count: count(stats.subcategory_count),
            low_stock_count: count(stats.low_stock_count),
            expiring_soon_count: count(stats.expiring_soon_count),
            expired_count: count(stats.expired_count),
            unassigned_count: count(stats.unassigned_count),
            message: String::new(),
        },
        Err(err) => DashboardResponse {
            ok: false,
            room_count: 0,
            container_count: 0,
            item_record_count: 0,
            total_quantity: 0,
            subcategory_count: 0,
            low_stock_count: 0,
            expiring_soon_count: 0,
            expired_count: 0,
            unassigned_count: 0,
            message: format!("dashboard_stats failed: {err}"),
        },
    }
}

fn to_location_response(resolution: &PathResolution) -> LocationResponse {
    let status = match resolution {
        PathResolution::Found(_) => "found",
        PathResolution::Degraded(_) => "degraded",
        PathResolution::NotFound => "not_found",
    };
    LocationResponse {
        status: status.to_string(),
        segment_ids: resolution
            .segments()
            .iter()
            .map(|segment| segment.id.clone())
            .collect(),
        segment_names: resolution
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        label: resolution.display_or_placeholder(PATH_SEPARATOR),
        message: String::new(),
    }
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| match CoreConfig::from_env() {
            Ok(config) => config.db_path,
            Err(err) => {
                log::warn!(
                    "event=ffi_config module=ffi status=degraded error={}",
                    err
                );
                CoreConfig::default().db_path
            }
        })
        .clone()
}

fn with_storage_service<T>(
    f: impl FnOnce(&mut StorageService<SqliteRecordSource<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("DB open failed: {err}"))?;
    let mut service = StorageService::new(SqliteRecordSource::new(&conn));
    f(&mut service)
}
