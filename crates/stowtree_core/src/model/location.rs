//! Area and container domain model.
//!
//! # Responsibility
//! - Define the normalized location records the hierarchy is built from.
//! - Keep the container parent reference explicit: one container parent,
//!   one area, or none.
//!
//! # Invariants
//! - `id` values are non-blank after wire normalization.
//! - A container never references both a parent container and an area.
//! - Areas are never nested under another area or container.

use serde::{Deserialize, Serialize};

/// Stable identifier of any stored record (area, container or item).
///
/// Identifiers come from the collaborator store as opaque strings, so the
/// core never interprets their shape.
pub type RecordId = String;

/// Display type reported for every area.
pub const AREA_KIND: &str = "room";

/// Top-level location such as a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: RecordId,
    pub name: String,
}

impl Area {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Where a container declares itself attached.
///
/// Serialized as `{"kind": "container" | "area", "id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    /// Nested inside another container (`parentId`).
    Container(RecordId),
    /// Placed directly in an area (`areaId`).
    Area(RecordId),
}

impl ParentRef {
    /// Returns the referenced identifier regardless of target kind.
    pub fn id(&self) -> &str {
        match self {
            Self::Container(id) | Self::Area(id) => id.as_str(),
        }
    }
}

/// Nested storage unit (cabinet, drawer, box, shelf...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: RecordId,
    pub name: String,
    /// Free-text type tag, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    /// `None` means the container was stored without any placement.
    pub parent: Option<ParentRef>,
}

impl Container {
    /// Creates an unplaced container with an empty type tag.
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: String::new(),
            description: None,
            parent: None,
        }
    }

    /// Places this container inside another container.
    pub fn in_container(mut self, parent_id: impl Into<RecordId>) -> Self {
        self.parent = Some(ParentRef::Container(parent_id.into()));
        self
    }

    /// Places this container directly in an area.
    pub fn in_area(mut self, area_id: impl Into<RecordId>) -> Self {
        self.parent = Some(ParentRef::Area(area_id.into()));
        self
    }

    /// Returns the parent container id, when nested in a container.
    pub fn parent_container_id(&self) -> Option<&str> {
        match &self.parent {
            Some(ParentRef::Container(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Returns the area id, when placed directly in an area.
    pub fn area_id(&self) -> Option<&str> {
        match &self.parent {
            Some(ParentRef::Area(id)) => Some(id.as_str()),
            _ => None,
        }
    }
}
