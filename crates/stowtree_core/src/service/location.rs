//! Location resolution pipeline.
//!
//! # Responsibility
//! - Turn any node id into a breadcrumb through one ordered pipeline:
//!   overview, tree walk, index fallback, cached or fetched record, and
//!   finally the placeholder.
//!
//! # Invariants
//! - One cache per resolver; it is cleared whenever the tree is rebuilt.
//! - Fetch failures degrade to `NotFound`; they are logged, never raised.

use crate::model::location::RecordId;
use crate::source::RecordSource;
use crate::tree::path::{resolve_detached, resolve_path, PathResolution};
use crate::tree::HierarchyTree;
use log::warn;
use std::collections::HashMap;

/// Breadcrumb resolver with a cache for on-demand fetched records.
#[derive(Debug, Default)]
pub struct LocationResolver {
    cache: HashMap<RecordId, PathResolution>,
}

impl LocationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached resolution.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Resolves `id` against `tree`, fetching the record when the tree misses.
    pub fn resolve<S: RecordSource + ?Sized>(
        &mut self,
        tree: &HierarchyTree,
        source: &S,
        id: &str,
    ) -> PathResolution {
        let resolution = resolve_path(tree, id);
        if resolution.is_resolved() {
            return resolution;
        }
        if let Some(cached) = self.cache.get(id) {
            return cached.clone();
        }

        let fetched = match source.fetch_container(id) {
            Ok(container) => resolve_detached(tree, &container),
            Err(err) => {
                warn!(
                    "event=location_resolve module=service status=degraded id={} error={}",
                    id, err
                );
                return PathResolution::NotFound;
            }
        };
        self.cache.insert(id.to_string(), fetched.clone());
        fetched
    }
}
