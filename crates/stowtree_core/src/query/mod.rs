//! Read-only queries over snapshots and item lists.

pub mod dashboard;
pub mod materials;
