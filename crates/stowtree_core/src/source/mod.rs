//! Record source contracts.
//!
//! # Responsibility
//! - Define the collaborator boundary the hierarchy is loaded from.
//! - Provide REST and local SQLite implementations.
//!
//! # Invariants
//! - Sources return normalized domain records only.
//! - `delete_containers` relocates affected items; it never deletes them.

use crate::db::DbError;
use crate::model::item::{Item, ItemValidationError};
use crate::model::location::{Area, Container, RecordId};
use crate::wire::{DecodedList, WireError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod rest;
pub mod sqlite;

pub use rest::RestRecordSource;
pub use sqlite::SqliteRecordSource;

pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from record source operations.
#[derive(Debug)]
pub enum SourceError {
    /// Local store failure.
    Db(DbError),
    /// Transport failure (connect, timeout, body read).
    Http(reqwest::Error),
    /// Collaborator answered with a non-success HTTP status.
    Status { endpoint: String, status: u16 },
    /// Payload could not be decoded.
    Wire(WireError),
    /// Requested record does not exist.
    NotFound(RecordId),
    /// Write rejected by item validation.
    Validation(ItemValidationError),
    /// Stored data cannot be converted to a domain record.
    InvalidData(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Http(err) => write!(f, "http request failed: {err}"),
            Self::Status { endpoint, status } => {
                write!(f, "{endpoint} returned http status {status}")
            }
            Self::Wire(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Http(err) => Some(err),
            Self::Wire(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Status { .. } | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SourceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SourceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<WireError> for SourceError {
    fn from(value: WireError) -> Self {
        Self::Wire(value)
    }
}

impl From<ItemValidationError> for SourceError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Flat-record collaborator the hierarchy is built from.
pub trait RecordSource {
    fn fetch_areas(&self) -> SourceResult<Vec<Area>>;
    fn fetch_containers(&self) -> SourceResult<Vec<Container>>;
    /// Fetches items; records that fail to normalize come back in `rejected`.
    fn fetch_items(&self) -> SourceResult<DecodedList<Item>>;
    /// Fetches one container by id, used for on-demand name resolution.
    fn fetch_container(&self, id: &str) -> SourceResult<Container>;
    /// Commits a cascade delete of the given container ids.
    fn delete_containers(&self, ids: &[RecordId]) -> SourceResult<()>;
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn fetch_areas(&self) -> SourceResult<Vec<Area>> {
        (**self).fetch_areas()
    }

    fn fetch_containers(&self) -> SourceResult<Vec<Container>> {
        (**self).fetch_containers()
    }

    fn fetch_items(&self) -> SourceResult<DecodedList<Item>> {
        (**self).fetch_items()
    }

    fn fetch_container(&self, id: &str) -> SourceResult<Container> {
        (**self).fetch_container(id)
    }

    fn delete_containers(&self, ids: &[RecordId]) -> SourceResult<()> {
        (**self).delete_containers(ids)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn fetch_areas(&self) -> SourceResult<Vec<Area>> {
        (**self).fetch_areas()
    }

    fn fetch_containers(&self) -> SourceResult<Vec<Container>> {
        (**self).fetch_containers()
    }

    fn fetch_items(&self) -> SourceResult<DecodedList<Item>> {
        (**self).fetch_items()
    }

    fn fetch_container(&self, id: &str) -> SourceResult<Container> {
        (**self).fetch_container(id)
    }

    fn delete_containers(&self, ids: &[RecordId]) -> SourceResult<()> {
        (**self).delete_containers(ids)
    }
}
