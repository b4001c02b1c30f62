//! SQLite-backed local record store.
//!
//! # Responsibility
//! - Persist areas, storage units and items in the migrated local schema.
//! - Serve the same flat-record contract as the REST source.
//!
//! # Invariants
//! - Listing order is insertion order (`rowid ASC`).
//! - Item writes call `Item::validate()` before SQL mutations.
//! - Cascade delete is one immediate transaction; items are relocated to the
//!   nearest surviving ancestor, or left unassigned.

use crate::model::item::Item;
use crate::model::location::{Area, Container, ParentRef, RecordId};
use crate::source::{RecordSource, SourceError, SourceResult};
use crate::wire::DecodedList;
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::{HashMap, HashSet};

const CONTAINER_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    description,
    parent_id,
    area_id
FROM storage_units";

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    quantity,
    unit,
    specification,
    category,
    subcategory,
    description,
    expiry_date,
    expiry_warning_days,
    stock_alert,
    storage_unit_id
FROM items";

/// Local store over a migrated SQLite connection.
pub struct SqliteRecordSource<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordSource<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn create_area(&self, area: &Area) -> SourceResult<RecordId> {
        ensure_id("area", &area.id)?;
        self.conn.execute(
            "INSERT INTO areas (id, name) VALUES (?1, ?2);",
            params![area.id.as_str(), area.name.as_str()],
        )?;
        Ok(area.id.clone())
    }

    pub fn create_container(&self, container: &Container) -> SourceResult<RecordId> {
        ensure_id("storage unit", &container.id)?;
        let (parent_id, area_id) = split_parent(container.parent.as_ref());
        self.conn.execute(
            "INSERT INTO storage_units (
                id,
                name,
                type,
                description,
                parent_id,
                area_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                container.id.as_str(),
                container.name.as_str(),
                container.kind.as_str(),
                container.description.as_deref(),
                parent_id,
                area_id,
            ],
        )?;
        Ok(container.id.clone())
    }

    pub fn create_item(&self, item: &Item) -> SourceResult<RecordId> {
        item.validate()?;
        self.conn.execute(
            "INSERT INTO items (
                id,
                name,
                quantity,
                unit,
                specification,
                category,
                subcategory,
                description,
                expiry_date,
                expiry_warning_days,
                stock_alert,
                storage_unit_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                item.id.as_str(),
                item.name.as_str(),
                item.quantity,
                item.unit.as_str(),
                item.specification.as_str(),
                item.category.as_str(),
                item.subcategory.as_str(),
                item.description.as_str(),
                item.expiry_date.map(|date| date.format("%Y-%m-%d").to_string()),
                item.expiry_warning_days,
                item.stock_alert,
                item.holder_id.as_deref(),
            ],
        )?;
        Ok(item.id.clone())
    }

    pub fn update_item_quantity(&self, item_id: &str, quantity: u32) -> SourceResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET quantity = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![item_id, quantity],
        )?;
        if changed == 0 {
            return Err(SourceError::NotFound(item_id.to_string()));
        }
        Ok(())
    }

    pub fn delete_item(&self, item_id: &str) -> SourceResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1;", [item_id])?;
        if changed == 0 {
            return Err(SourceError::NotFound(item_id.to_string()));
        }
        Ok(())
    }

    pub fn get_item(&self, item_id: &str) -> SourceResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([item_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
    }
}

impl RecordSource for SqliteRecordSource<'_> {
    fn fetch_areas(&self) -> SourceResult<Vec<Area>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM areas ORDER BY rowid ASC;")?;
        let rows = stmt.query_map([], |row| {
            Ok(Area::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;
        let mut areas = Vec::new();
        for area in rows {
            areas.push(area?);
        }
        Ok(areas)
    }

    fn fetch_containers(&self) -> SourceResult<Vec<Container>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTAINER_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut containers = Vec::new();
        while let Some(row) = rows.next()? {
            containers.push(parse_container_row(row)?);
        }
        Ok(containers)
    }

    fn fetch_items(&self) -> SourceResult<DecodedList<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(DecodedList::complete(items))
    }

    fn fetch_container(&self, id: &str) -> SourceResult<Container> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTAINER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_container_row(row),
            None => Err(SourceError::NotFound(id.to_string())),
        }
    }

    fn delete_containers(&self, ids: &[RecordId]) -> SourceResult<()> {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let placements = load_placements(&tx)?;

        let mut relocated_items = 0usize;
        for id in &doomed {
            if !placements.contains_key(*id) {
                continue;
            }
            let destination = surviving_ancestor(&placements, &doomed, id);
            let (container_target, area_target) = split_parent(destination.as_ref());

            relocated_items += tx.execute(
                "UPDATE items
                 SET storage_unit_id = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE storage_unit_id = ?1;",
                params![*id, container_target.or(area_target)],
            )?;

            // Surviving children of a deleted unit move up with the items.
            tx.execute(
                "UPDATE storage_units
                 SET parent_id = ?2,
                     area_id = ?3
                 WHERE parent_id = ?1;",
                params![*id, container_target, area_target],
            )?;
        }

        let mut deleted = 0usize;
        for id in &doomed {
            deleted += tx.execute("DELETE FROM storage_units WHERE id = ?1;", [*id])?;
        }

        tx.commit()?;
        info!(
            "event=container_delete module=source status=ok requested={} deleted={} relocated_items={}",
            doomed.len(),
            deleted,
            relocated_items
        );
        Ok(())
    }
}

type Placement = (Option<String>, Option<String>);

fn load_placements(tx: &Transaction<'_>) -> SourceResult<HashMap<String, Placement>> {
    let mut stmt = tx.prepare("SELECT id, parent_id, area_id FROM storage_units;")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            (row.get::<_, Option<String>>(1)?, row.get::<_, Option<String>>(2)?),
        ))
    })?;
    let mut placements = HashMap::new();
    for row in rows {
        let (id, placement) = row?;
        placements.insert(id, placement);
    }
    Ok(placements)
}

/// Walks up from `start` past every doomed unit.
///
/// Returns the first surviving container or the area of the last doomed
/// unit; `None` when the chain ends, dangles or loops.
fn surviving_ancestor(
    placements: &HashMap<String, Placement>,
    doomed: &HashSet<&str>,
    start: &str,
) -> Option<ParentRef> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = start;
    loop {
        if !seen.insert(current) {
            return None;
        }
        let (parent_id, area_id) = placements.get(current)?;
        match (parent_id.as_deref(), area_id.as_deref()) {
            (Some(parent), _) if doomed.contains(parent) => current = parent,
            (Some(parent), _) if placements.contains_key(parent) => {
                return Some(ParentRef::Container(parent.to_string()))
            }
            (Some(_), _) => return None,
            (None, Some(area)) => return Some(ParentRef::Area(area.to_string())),
            (None, None) => return None,
        }
    }
}

fn split_parent(parent: Option<&ParentRef>) -> (Option<&str>, Option<&str>) {
    match parent {
        Some(ParentRef::Container(id)) => (Some(id.as_str()), None),
        Some(ParentRef::Area(id)) => (None, Some(id.as_str())),
        None => (None, None),
    }
}

fn ensure_id(kind: &str, id: &str) -> SourceResult<()> {
    if id.trim().is_empty() {
        return Err(SourceError::InvalidData(format!("{kind} id must not be blank")));
    }
    Ok(())
}

fn parse_container_row(row: &Row<'_>) -> SourceResult<Container> {
    let parent_id: Option<String> = row.get(4)?;
    let area_id: Option<String> = row.get(5)?;
    let parent = match (parent_id, area_id) {
        (Some(parent_id), _) => Some(ParentRef::Container(parent_id)),
        (None, Some(area_id)) => Some(ParentRef::Area(area_id)),
        (None, None) => None,
    };
    Ok(Container {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        description: row.get(3)?,
        parent,
    })
}

fn parse_item_row(row: &Row<'_>) -> SourceResult<Item> {
    let id: String = row.get(0)?;
    let quantity: i64 = row.get(2)?;
    let expiry_raw: Option<String> = row.get(8)?;

    let mut item = Item::new(id.clone(), row.get::<_, String>(1)?);
    item.quantity = to_u32(&id, "quantity", quantity)?;
    item.unit = row.get(3)?;
    item.specification = row.get(4)?;
    item.category = row.get(5)?;
    item.subcategory = row.get(6)?;
    item.description = row.get(7)?;
    item.expiry_date = expiry_raw
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                SourceError::InvalidData(format!("invalid expiry_date `{raw}` for item {id}"))
            })
        })
        .transpose()?;
    item.expiry_warning_days = row
        .get::<_, Option<i64>>(9)?
        .map(|value| to_u32(&id, "expiry_warning_days", value))
        .transpose()?;
    item.stock_alert = row
        .get::<_, Option<i64>>(10)?
        .map(|value| to_u32(&id, "stock_alert", value))
        .transpose()?;
    item.holder_id = row.get(11)?;
    Ok(item)
}

fn to_u32(id: &str, column: &str, value: i64) -> SourceResult<u32> {
    u32::try_from(value)
        .map_err(|_| SourceError::InvalidData(format!("invalid {column} `{value}` for item {id}")))
}
