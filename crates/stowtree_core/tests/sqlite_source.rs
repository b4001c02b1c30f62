use stowtree_core::db::open_db_in_memory;
use stowtree_core::{
    Area, Container, Item, ItemValidationError, RecordSource, SourceError, SqliteRecordSource,
};

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn seed(source: &SqliteRecordSource<'_>) {
    source.create_area(&Area::new("r1", "Kitchen")).unwrap();
    source
        .create_container(&Container::new("c1", "Cabinet").in_area("r1"))
        .unwrap();
    source
        .create_container(&Container::new("c2", "Drawer").in_container("c1"))
        .unwrap();
    source
        .create_container(&Container::new("c3", "Crate"))
        .unwrap();
    source
        .create_item(&Item::new("i1", "Spoon").held_by("c2").with_quantity(6))
        .unwrap();
    source
        .create_item(&Item::new("i2", "Pot").held_by("c1").with_quantity(1))
        .unwrap();
    source
        .create_item(&Item::new("i3", "Cable").held_by("c3").with_quantity(2))
        .unwrap();
}

#[test]
fn records_round_trip_in_insertion_order() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);
    seed(&source);

    let containers = source.fetch_containers().unwrap();
    let ids: Vec<&str> = containers.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    assert_eq!(containers[0].area_id(), Some("r1"));
    assert_eq!(containers[1].parent_container_id(), Some("c1"));
    assert!(containers[2].parent.is_none());

    let items = source.fetch_items().unwrap().records;
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].holder_id.as_deref(), Some("c2"));
    assert_eq!(items[0].quantity, 6);
}

#[test]
fn item_writes_validate_and_report_missing_rows() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);

    let err = source.create_item(&Item::new("i9", "  ")).unwrap_err();
    assert!(matches!(
        err,
        SourceError::Validation(ItemValidationError::BlankName)
    ));

    source.create_item(&Item::new("i1", "Tape")).unwrap();
    source.update_item_quantity("i1", 12).unwrap();
    assert_eq!(source.get_item("i1").unwrap().unwrap().quantity, 12);

    assert!(matches!(
        source.update_item_quantity("ghost", 1),
        Err(SourceError::NotFound(_))
    ));
    source.delete_item("i1").unwrap();
    assert!(source.get_item("i1").unwrap().is_none());
}

#[test]
fn fetch_container_reports_not_found() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);
    seed(&source);

    assert_eq!(source.fetch_container("c2").unwrap().name, "Drawer");
    assert!(matches!(
        source.fetch_container("zzz"),
        Err(SourceError::NotFound(id)) if id == "zzz"
    ));
}

#[test]
fn cascade_delete_moves_items_to_surviving_area() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);
    seed(&source);

    source
        .delete_containers(&["c1".to_string(), "c2".to_string()])
        .unwrap();

    let remaining: Vec<String> = source
        .fetch_containers()
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(remaining, vec!["c3".to_string()]);

    let spoon = source.get_item("i1").unwrap().unwrap();
    let pot = source.get_item("i2").unwrap().unwrap();
    assert_eq!(spoon.holder_id.as_deref(), Some("r1"));
    assert_eq!(pot.holder_id.as_deref(), Some("r1"));
}

#[test]
fn deleting_nested_unit_moves_items_to_parent_container() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);
    seed(&source);

    source.delete_containers(&["c2".to_string()]).unwrap();
    let spoon = source.get_item("i1").unwrap().unwrap();
    assert_eq!(spoon.holder_id.as_deref(), Some("c1"));
}

#[test]
fn deleting_top_level_unit_leaves_items_unassigned() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);
    seed(&source);

    source.delete_containers(&["c3".to_string()]).unwrap();
    let cable = source.get_item("i3").unwrap().unwrap();
    assert_eq!(cable.holder_id, None);
    assert_eq!(source.fetch_items().unwrap().records.len(), 3);
}

#[test]
fn surviving_children_of_deleted_unit_move_up() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);
    seed(&source);

    source.delete_containers(&["c1".to_string()]).unwrap();
    let drawer = source.fetch_container("c2").unwrap();
    assert_eq!(drawer.area_id(), Some("r1"));
}

#[test]
fn expiry_dates_persist_as_calendar_days() {
    let conn = setup();
    let source = SqliteRecordSource::new(&conn);

    let mut milk = Item::new("i1", "Milk");
    milk.expiry_date = chrono::NaiveDate::from_ymd_opt(2026, 5, 4);
    milk.stock_alert = Some(2);
    source.create_item(&milk).unwrap();

    let stored = source.get_item("i1").unwrap().unwrap();
    assert_eq!(stored, milk);
}
