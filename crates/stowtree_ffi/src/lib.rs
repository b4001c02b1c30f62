//! Flutter-facing bindings for stowtree core.

pub mod api;
