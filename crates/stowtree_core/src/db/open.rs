//! Connection bootstrap for the local store.
//!
//! # Invariants
//! - Every returned connection has migrations fully applied.
//! - File databases run in WAL mode; in-memory ones keep the default journal.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::CoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Target<'a> {
    File(&'a Path),
    Memory,
}

impl Target<'_> {
    fn mode(self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens (creating when needed) the database file at `path`.
///
/// Missing parent directories are created first.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_target(Target::File(path.as_ref()))
}

/// Opens a throwaway in-memory database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target(Target::Memory)
}

/// Opens the database file named by `config.db_path`.
pub fn open_db_from_config(config: &CoreConfig) -> DbResult<Connection> {
    open_db(&config.db_path)
}

fn open_target(target: Target<'_>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();

    match connect(target) {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn connect(target: Target<'_>) -> DbResult<Connection> {
    let mut conn = match target {
        Target::File(path) => {
            ensure_parent_dir(path)?;
            let conn = Connection::open(path)?;
            let _journal: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            conn
        }
        Target::Memory => Connection::open_in_memory()?,
    };
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })
}
