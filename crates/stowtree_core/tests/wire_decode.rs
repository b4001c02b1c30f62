use serde_json::json;
use stowtree_core::wire::{
    decode_ack, decode_areas, decode_containers, decode_items, encode_delete_request,
};
use stowtree_core::{ParentRef, WireError};

#[test]
fn area_list_prefers_object_id() {
    let body = json!({
        "success": true,
        "count": 2,
        "data": [
            {"_id": "65f0a1", "id": "legacy", "name": "Kitchen"},
            {"id": 7, "name": "Garage"}
        ]
    })
    .to_string();

    let areas = decode_areas(&body).unwrap();
    assert_eq!(areas[0].id, "65f0a1");
    assert_eq!(areas[1].id, "7");
    assert_eq!(areas[1].name, "Garage");
}

#[test]
fn rejected_envelope_carries_message() {
    let body = json!({"success": false, "message": "database offline"}).to_string();
    match decode_containers(&body) {
        Err(WireError::Rejected(message)) => assert_eq!(message, "database offline"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn successful_envelope_without_data_is_an_error() {
    let body = json!({"success": true}).to_string();
    assert!(matches!(decode_items(&body), Err(WireError::MissingData)));
}

#[test]
fn malformed_body_is_a_json_error() {
    assert!(matches!(decode_areas("not json"), Err(WireError::Json(_))));
}

#[test]
fn record_without_any_id_is_rejected() {
    let body = json!({"success": true, "data": [{"name": "Nameless"}]}).to_string();
    assert!(matches!(
        decode_containers(&body),
        Err(WireError::MissingId { .. })
    ));
}

#[test]
fn container_placement_normalizes() {
    let body = json!({
        "success": true,
        "data": [
            {"_id": "c1", "name": "Cabinet", "type": "cabinet", "areaId": "r1"},
            {"_id": "c2", "name": "Drawer", "parentId": "c1", "description": ""},
            {"_id": "c3", "name": "Loose", "parentId": null, "areaId": ""}
        ]
    })
    .to_string();

    let containers = decode_containers(&body).unwrap();
    assert_eq!(containers[0].kind, "cabinet");
    assert_eq!(containers[0].parent, Some(ParentRef::Area("r1".to_string())));
    assert_eq!(
        containers[1].parent,
        Some(ParentRef::Container("c1".to_string()))
    );
    assert_eq!(containers[1].description, None);
    assert_eq!(containers[2].parent, None);
}

#[test]
fn item_fields_normalize() {
    let body = json!({
        "success": true,
        "data": [{
            "_id": "i1",
            "name": "Rice",
            "quantity": "12",
            "unit": "kg",
            "subcategory": "Grains",
            "expiryDate": "2026-09-30",
            "expiryWarningDays": 14,
            "stockAlert": "5",
            "storageUnitId": "c2",
            "storageUnit": "legacy"
        }]
    })
    .to_string();

    let item = decode_items(&body).unwrap().records.remove(0);
    assert_eq!(item.quantity, 12);
    assert_eq!(item.unit, "kg");
    assert_eq!(item.expiry_warning_days, Some(14));
    assert_eq!(item.stock_alert, Some(5));
    assert_eq!(item.holder_id.as_deref(), Some("c2"));
    assert_eq!(
        item.expiry_date,
        chrono::NaiveDate::from_ymd_opt(2026, 9, 30)
    );
}

#[test]
fn item_form_field_names_are_accepted() {
    let body = json!({
        "success": true,
        "data": [{
            "_id": "i1",
            "name": "Ethanol",
            "spec": "500ml",
            "expiryWarning": 7,
            "quantity": 2,
            "storageUnitId": "c4"
        }]
    })
    .to_string();

    let item = decode_items(&body).unwrap().records.remove(0);
    assert_eq!(item.specification, "500ml");
    assert_eq!(item.expiry_warning_days, Some(7));
    assert_eq!(item.holder_id.as_deref(), Some("c4"));
}

#[test]
fn unparseable_expiry_skips_only_that_item() {
    let body = json!({
        "success": true,
        "data": [
            {"_id": "i1", "name": "Milk", "expiryDate": "next week"},
            {"_id": "i2", "name": "Flour", "expiryDate": "2026-12-01"},
            {"name": "Nameless"}
        ]
    })
    .to_string();

    let decoded = decode_items(&body).unwrap();
    assert!(!decoded.is_complete());
    let ids: Vec<&str> = decoded.records.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["i2"]);

    assert_eq!(decoded.rejected.len(), 2);
    assert_eq!(decoded.rejected[0].position, 0);
    assert_eq!(decoded.rejected[0].id.as_deref(), Some("i1"));
    assert!(decoded.rejected[0].reason.contains("expiryDate"));
    assert_eq!(decoded.rejected[1].position, 2);
    assert_eq!(decoded.rejected[1].id, None);
}

#[test]
fn delete_request_uses_storage_unit_ids() {
    let body = encode_delete_request(&["c1".to_string(), "c2".to_string()]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value, json!({"storageUnitIds": ["c1", "c2"]}));
}

#[test]
fn acknowledgement_only_checks_success() {
    assert!(decode_ack(&json!({"success": true}).to_string()).is_ok());
    assert!(matches!(
        decode_ack(&json!({"success": false, "message": "locked"}).to_string()),
        Err(WireError::Rejected(_))
    ));
}
