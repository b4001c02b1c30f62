//! Collaborator payload adapter.
//!
//! # Responsibility
//! - Decode `{success, data, message, count}` envelopes from the REST layer.
//! - Normalize wire shapes (`_id`/`id`, `parentId`/`areaId`,
//!   `storageUnitId`/`storageUnit`) into domain records exactly once.
//!
//! # Invariants
//! - `_id` takes precedence over `id`; numeric ids are rendered as strings.
//! - Empty-string references count as absent.
//! - A container with both `parentId` and `areaId` keeps `parentId`.
//! - Negative quantities clamp to zero.
//! - One malformed item is rejected on its own; the rest of the list decodes.

use crate::model::item::Item;
use crate::model::location::{Area, Container, ParentRef, RecordId};
use chrono::{DateTime, NaiveDate};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type WireResult<T> = Result<T, WireError>;

/// Errors from decoding collaborator payloads.
#[derive(Debug)]
pub enum WireError {
    /// Body is not valid JSON or does not match the expected shape.
    Json(serde_json::Error),
    /// Envelope reported `success: false`.
    Rejected(String),
    /// Successful envelope without `data`.
    MissingData,
    /// Record carries neither `_id` nor `id`.
    MissingId { kind: &'static str },
    /// Field present but not interpretable.
    InvalidField { field: &'static str, value: String },
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed payload: {err}"),
            Self::Rejected(message) => write!(f, "request rejected: {message}"),
            Self::MissingData => write!(f, "envelope has no data"),
            Self::MissingId { kind } => write!(f, "{kind} record has no id"),
            Self::InvalidField { field, value } => {
                write!(f, "invalid value `{value}` for field `{field}`")
            }
        }
    }
}

impl Error for WireError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for WireError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Response envelope shared by every collaborator endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub count: Option<u64>,
}

impl<T> Envelope<T> {
    /// Returns `data` of a successful envelope.
    pub fn into_data(self) -> WireResult<T> {
        if !self.success {
            return Err(WireError::Rejected(
                self.message
                    .unwrap_or_else(|| "no message".to_string()),
            ));
        }
        self.data.ok_or(WireError::MissingData)
    }
}

/// Parses an envelope body and returns its `data`.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> WireResult<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    envelope.into_data()
}

/// Checks an envelope whose `data` is irrelevant (write acknowledgements).
pub fn decode_ack(body: &str) -> WireResult<()> {
    let envelope: Envelope<Value> = serde_json::from_str(body)?;
    if envelope.success {
        return Ok(());
    }
    Err(WireError::Rejected(
        envelope
            .message
            .unwrap_or_else(|| "no message".to_string()),
    ))
}

/// Identifier that may arrive as a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl WireId {
    fn normalize(&self) -> Option<RecordId> {
        match self {
            Self::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(number) => Some(number.to_string()),
        }
    }
}

fn pick_id(primary: Option<&WireId>, fallback: Option<&WireId>) -> Option<RecordId> {
    primary
        .and_then(WireId::normalize)
        .or_else(|| fallback.and_then(WireId::normalize))
}

/// Area record as sent by the REST layer.
#[derive(Debug, Deserialize)]
pub struct WireArea {
    #[serde(rename = "_id")]
    pub object_id: Option<WireId>,
    pub id: Option<WireId>,
    #[serde(default)]
    pub name: String,
}

impl WireArea {
    pub fn normalize(self) -> WireResult<Area> {
        let id = pick_id(self.object_id.as_ref(), self.id.as_ref())
            .ok_or(WireError::MissingId { kind: "area" })?;
        Ok(Area::new(id, self.name))
    }
}

/// Storage unit record as sent by the REST layer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireContainer {
    #[serde(rename = "_id")]
    pub object_id: Option<WireId>,
    pub id: Option<WireId>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<WireId>,
    pub area_id: Option<WireId>,
}

impl WireContainer {
    pub fn normalize(self) -> WireResult<Container> {
        let id = pick_id(self.object_id.as_ref(), self.id.as_ref())
            .ok_or(WireError::MissingId { kind: "storage unit" })?;
        let parent = match (
            self.parent_id.as_ref().and_then(WireId::normalize),
            self.area_id.as_ref().and_then(WireId::normalize),
        ) {
            (Some(parent_id), _) => Some(ParentRef::Container(parent_id)),
            (None, Some(area_id)) => Some(ParentRef::Area(area_id)),
            (None, None) => None,
        };
        Ok(Container {
            id,
            name: self.name,
            kind: self.kind.unwrap_or_default(),
            description: self.description.filter(|text| !text.trim().is_empty()),
            parent,
        })
    }
}

/// Item record as sent by the REST layer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    #[serde(rename = "_id")]
    pub object_id: Option<WireId>,
    pub id: Option<WireId>,
    #[serde(default)]
    pub name: String,
    pub quantity: Option<Value>,
    pub unit: Option<String>,
    #[serde(alias = "spec")]
    pub specification: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub expiry_date: Option<String>,
    #[serde(alias = "expiryWarning")]
    pub expiry_warning_days: Option<Value>,
    pub stock_alert: Option<Value>,
    pub storage_unit_id: Option<WireId>,
    /// Legacy holder field from older records.
    pub storage_unit: Option<WireId>,
}

impl WireItem {
    pub fn normalize(self) -> WireResult<Item> {
        let id = pick_id(self.object_id.as_ref(), self.id.as_ref())
            .ok_or(WireError::MissingId { kind: "item" })?;
        let mut item = Item::new(id, self.name);
        item.quantity = parse_count("quantity", self.quantity.as_ref())?.unwrap_or(0);
        item.unit = self.unit.unwrap_or_default();
        item.specification = self.specification.unwrap_or_default();
        item.category = self.category.unwrap_or_default();
        item.subcategory = self.subcategory.unwrap_or_default();
        item.description = self.description.unwrap_or_default();
        item.expiry_date = parse_expiry(self.expiry_date.as_deref())?;
        item.expiry_warning_days =
            parse_count("expiryWarningDays", self.expiry_warning_days.as_ref())?;
        item.stock_alert = parse_count("stockAlert", self.stock_alert.as_ref())?;
        item.holder_id = pick_id(self.storage_unit_id.as_ref(), self.storage_unit.as_ref());
        Ok(item)
    }
}

/// Decodes an area list envelope.
pub fn decode_areas(body: &str) -> WireResult<Vec<Area>> {
    decode_envelope::<Vec<WireArea>>(body)?
        .into_iter()
        .map(WireArea::normalize)
        .collect()
}

/// Decodes a storage unit list envelope.
pub fn decode_containers(body: &str) -> WireResult<Vec<Container>> {
    decode_envelope::<Vec<WireContainer>>(body)?
        .into_iter()
        .map(WireContainer::normalize)
        .collect()
}

/// Decodes a single storage unit envelope.
pub fn decode_container(body: &str) -> WireResult<Container> {
    decode_envelope::<WireContainer>(body)?.normalize()
}

/// List payload after per-record normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedList<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedRecord>,
}

impl<T> DecodedList<T> {
    /// Wraps records that needed no per-record recovery.
    pub fn complete(records: Vec<T>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// List entry left out because it could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    /// Zero-based position in the envelope's `data` array.
    pub position: usize,
    pub id: Option<RecordId>,
    pub reason: String,
}

impl Display for RejectedRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "record {id} (#{}): {}", self.position, self.reason),
            None => write!(f, "record #{}: {}", self.position, self.reason),
        }
    }
}

/// Decodes an item list envelope.
///
/// Envelope-level problems fail the call. Items whose fields cannot be
/// normalized (bad date, non-numeric count, no id) are reported in
/// `rejected` and the remaining items still decode.
pub fn decode_items(body: &str) -> WireResult<DecodedList<Item>> {
    let wire_items = decode_envelope::<Vec<WireItem>>(body)?;
    let mut decoded = DecodedList::complete(Vec::with_capacity(wire_items.len()));
    for (position, wire_item) in wire_items.into_iter().enumerate() {
        let id = pick_id(wire_item.object_id.as_ref(), wire_item.id.as_ref());
        match wire_item.normalize() {
            Ok(item) => decoded.records.push(item),
            Err(err) => {
                warn!(
                    "event=wire_decode module=wire status=degraded kind=item position={} id={} error={}",
                    position,
                    id.as_deref().unwrap_or("-"),
                    err
                );
                decoded.rejected.push(RejectedRecord {
                    position,
                    id,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(decoded)
}

/// Body of `POST storage_units/delete-multiple`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContainersRequest<'a> {
    pub storage_unit_ids: &'a [RecordId],
}

/// Encodes the cascade-delete request body.
pub fn encode_delete_request(ids: &[RecordId]) -> WireResult<String> {
    Ok(serde_json::to_string(&DeleteContainersRequest {
        storage_unit_ids: ids,
    })?)
}

/// Non-negative count from a number or numeric string.
///
/// `null`/blank → `None`; negatives clamp to zero.
fn parse_count(field: &'static str, value: Option<&Value>) -> WireResult<Option<u32>> {
    let invalid = |raw: &Value| WireError::InvalidField {
        field,
        value: raw.to_string(),
    };
    let number = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(raw @ Value::Number(number)) => number.as_f64().ok_or_else(|| invalid(raw))?,
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(raw @ Value::String(text)) => text.trim().parse::<f64>().map_err(|_| invalid(raw))?,
        Some(raw) => return Err(invalid(raw)),
    };
    if !number.is_finite() {
        return Err(WireError::InvalidField {
            field,
            value: number.to_string(),
        });
    }
    Ok(Some(number.clamp(0.0, f64::from(u32::MAX)).trunc() as u32))
}

fn parse_expiry(value: Option<&str>) -> WireResult<Option<NaiveDate>> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| Some(timestamp.date_naive()))
        .map_err(|_| WireError::InvalidField {
            field: "expiryDate",
            value: raw.to_string(),
        })
}
