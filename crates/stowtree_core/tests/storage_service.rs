use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use stowtree_core::db::open_db_in_memory;
use stowtree_core::source::SourceResult;
use stowtree_core::{
    materials_by_subcategory, search_items, Area, Container, DecodedList, InventoryState, Item,
    PathResolution, PathSegment, RecordId, RecordSlice, RecordSource, RejectedRecord,
    SourceError, SqliteRecordSource, StorageService, StorageServiceError, TreeEvent,
};

/// In-memory source with switchable failures and call counters.
#[derive(Default)]
struct FakeSource {
    areas: Vec<Area>,
    containers: Vec<Container>,
    items: Vec<Item>,
    rejected_items: Vec<RejectedRecord>,
    detached: HashMap<String, Container>,
    fail_items: bool,
    fail_delete: bool,
    container_fetches: Cell<usize>,
    deleted: RefCell<Vec<RecordId>>,
}

impl RecordSource for FakeSource {
    fn fetch_areas(&self) -> SourceResult<Vec<Area>> {
        Ok(self.areas.clone())
    }

    fn fetch_containers(&self) -> SourceResult<Vec<Container>> {
        Ok(self.containers.clone())
    }

    fn fetch_items(&self) -> SourceResult<DecodedList<Item>> {
        if self.fail_items {
            return Err(SourceError::Status {
                endpoint: "items".to_string(),
                status: 503,
            });
        }
        Ok(DecodedList {
            records: self.items.clone(),
            rejected: self.rejected_items.clone(),
        })
    }

    fn fetch_container(&self, id: &str) -> SourceResult<Container> {
        self.container_fetches.set(self.container_fetches.get() + 1);
        self.detached
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    fn delete_containers(&self, ids: &[RecordId]) -> SourceResult<()> {
        if self.fail_delete {
            return Err(SourceError::InvalidData("delete refused".to_string()));
        }
        self.deleted.borrow_mut().extend(ids.iter().cloned());
        Ok(())
    }
}

fn kitchen_source() -> FakeSource {
    FakeSource {
        areas: vec![Area::new("r1", "Kitchen")],
        containers: vec![
            Container::new("c1", "Cabinet").in_area("r1"),
            Container::new("c2", "Drawer").in_container("c1"),
        ],
        items: vec![Item::new("i1", "Spoon").held_by("c2")],
        ..FakeSource::default()
    }
}

#[test]
fn failing_slice_degrades_to_empty_with_notice() {
    let source = FakeSource {
        fail_items: true,
        ..kitchen_source()
    };
    let mut state = InventoryState::new();
    let snapshot = state.refresh(&source);

    assert_eq!(snapshot.tree().node_count(), 3);
    assert!(snapshot.items().is_empty());
    assert!(!snapshot.is_complete());
    assert_eq!(snapshot.notices().len(), 1);
    assert_eq!(snapshot.notices()[0].slice, RecordSlice::Items);
    assert!(snapshot.notices()[0].message.contains("503"));
}

#[test]
fn rejected_items_are_reported_while_the_rest_attach() {
    let source = FakeSource {
        rejected_items: vec![RejectedRecord {
            position: 1,
            id: Some("i2".to_string()),
            reason: "invalid value `soon` for field `expiryDate`".to_string(),
        }],
        ..kitchen_source()
    };
    let mut state = InventoryState::new();
    let snapshot = state.refresh(&source);

    assert_eq!(snapshot.items().len(), 1);
    assert_eq!(snapshot.attach_report().attached, 1);
    assert!(!snapshot.is_complete());
    assert_eq!(snapshot.notices().len(), 1);
    let notice = &snapshot.notices()[0];
    assert_eq!(notice.slice, RecordSlice::Items);
    assert!(notice.message.starts_with("skipped 1 malformed record(s)"));
    assert!(notice.message.contains("i2"));
}

#[test]
fn each_refresh_bumps_generation_and_notifies() {
    let source = kitchen_source();
    let mut state = InventoryState::new();
    let events = state.subscribe();

    let first = state.refresh(&source);
    let second = state.refresh(&source);

    assert_eq!(first.generation(), 1);
    assert_eq!(second.generation(), 2);
    assert_eq!(first.tree().node_count(), 3);
    let received: Vec<TreeEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            TreeEvent::TreeChanged { generation: 1 },
            TreeEvent::TreeChanged { generation: 2 },
        ]
    );
}

#[test]
fn delete_commits_plan_ids_and_refreshes() {
    let mut service = StorageService::new(kitchen_source());
    let events = service.subscribe();
    service.refresh();

    let plan = service.delete_container("c1").unwrap();
    assert_eq!(
        *service.source().deleted.borrow(),
        vec!["c1".to_string(), "c2".to_string()]
    );
    assert_eq!(plan.items_to_move.len(), 1);
    assert_eq!(service.snapshot().generation(), 2);
    assert_eq!(events.try_iter().count(), 2);
}

#[test]
fn failed_commit_keeps_snapshot() {
    let source = FakeSource {
        fail_delete: true,
        ..kitchen_source()
    };
    let mut service = StorageService::new(source);
    service.refresh();

    let err = service.delete_container("c1").unwrap_err();
    assert!(matches!(err, StorageServiceError::Source(_)));
    assert_eq!(service.snapshot().generation(), 1);
    assert!(service.snapshot().tree().contains("c1"));
}

#[test]
fn area_target_is_rejected_by_service() {
    let mut service = StorageService::new(kitchen_source());
    service.refresh();
    assert!(matches!(
        service.delete_container("r1"),
        Err(StorageServiceError::Plan(_))
    ));
    assert!(service.source().deleted.borrow().is_empty());
}

#[test]
fn detached_container_is_fetched_once_and_cached_until_refresh() {
    let mut source = kitchen_source();
    source.detached.insert(
        "c9".to_string(),
        Container::new("c9", "Spice Rack").in_area("r1"),
    );
    let mut service = StorageService::new(source);
    service.refresh();

    let expected = PathResolution::Degraded(vec![
        PathSegment::new("r1", "Kitchen"),
        PathSegment::new("c9", "Spice Rack"),
    ]);
    assert_eq!(service.resolve_location("c9"), expected);
    assert_eq!(service.resolve_location("c9"), expected);
    assert_eq!(service.source().container_fetches.get(), 1);

    service.refresh();
    assert_eq!(service.location_label("c9", " > "), "Kitchen > Spice Rack");
    assert_eq!(service.source().container_fetches.get(), 2);
}

#[test]
fn in_tree_ids_never_hit_the_source() {
    let mut service = StorageService::new(kitchen_source());
    service.refresh();

    assert_eq!(
        service.resolve_location("c2").names(),
        vec!["Kitchen", "Cabinet", "Drawer"]
    );
    assert_eq!(service.resolve_location("overview").names(), vec!["Overview"]);
    assert_eq!(service.source().container_fetches.get(), 0);
}

#[test]
fn unknown_location_uses_placeholder() {
    let mut service = StorageService::new(kitchen_source());
    service.refresh();
    assert_eq!(service.location_label("ghost", "-"), "Unknown location");
}

#[test]
fn item_location_follows_holder() {
    let mut service = StorageService::new(kitchen_source());
    service.refresh();
    assert_eq!(
        service.item_location("i1").names(),
        vec!["Kitchen", "Cabinet", "Drawer"]
    );
    assert_eq!(service.item_location("nope"), PathResolution::NotFound);
}

#[test]
fn search_and_materials_run_over_the_refreshed_items() {
    let mut source = kitchen_source();
    let mut ladle = Item::new("i2", "Ladle").held_by("c1");
    ladle.subcategory = "Utensils".to_string();
    source.items.push(ladle);
    let mut service = StorageService::new(source);
    let snapshot = service.refresh();

    let hits = search_items(snapshot.items(), "LADLE");
    assert_eq!(hits.len(), 1);
    let holder = hits[0].holder_id.clone().unwrap();
    assert_eq!(service.location_label(&holder, " > "), "Kitchen > Cabinet");

    let groups = materials_by_subcategory(snapshot.items());
    let names: Vec<&str> = groups.iter().map(|g| g.subcategory.as_str()).collect();
    assert_eq!(names, vec!["Uncategorized", "Utensils"]);
}

#[test]
fn sqlite_backed_kitchen_scenario() {
    let conn = open_db_in_memory().unwrap();
    let source = SqliteRecordSource::new(&conn);
    source.create_area(&Area::new("r1", "Kitchen")).unwrap();
    source
        .create_container(&Container::new("c1", "Cabinet").in_area("r1"))
        .unwrap();
    source
        .create_container(&Container::new("c2", "Drawer").in_container("c1"))
        .unwrap();
    source
        .create_item(&Item::new("i1", "Spoon").held_by("c2"))
        .unwrap();

    let mut service = StorageService::new(source);
    service.refresh();
    assert_eq!(service.location_label("c2", "-"), "Kitchen-Cabinet-Drawer");

    let plan = service.plan_delete("c1").unwrap();
    assert_eq!(plan.relocation_target(), Some("r1"));

    service.delete_container("c1").unwrap();
    let snapshot = service.snapshot();
    assert!(!snapshot.tree().contains("c1"));
    assert!(!snapshot.tree().contains("c2"));
    let kitchen = snapshot.tree().find("r1").unwrap();
    assert_eq!(kitchen.items.len(), 1);
    assert_eq!(kitchen.items[0].id, "i1");
}
