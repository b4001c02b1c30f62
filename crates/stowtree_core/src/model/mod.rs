//! Normalized inventory domain model.
//!
//! # Responsibility
//! - Define canonical area/container/item records used by core logic.
//! - Keep one entity shape per record kind; wire variants are resolved
//!   before records reach this layer.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - Items have exactly one direct holder at a time, or none.

pub mod item;
pub mod location;
