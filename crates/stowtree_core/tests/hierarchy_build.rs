use stowtree_core::tree::traverse::{path_to, walk, Visit};
use stowtree_core::{
    build_tree, total_sub_containers, Area, Container, NodeKind, ParentRef, MAX_EXPORT_DEPTH,
};

fn household() -> (Vec<Area>, Vec<Container>) {
    let areas = vec![Area::new("r1", "Kitchen"), Area::new("r2", "Garage")];
    let containers = vec![
        Container::new("c1", "Cabinet").in_area("r1"),
        Container::new("c2", "Drawer").in_container("c1"),
        Container::new("c3", "Tool Chest").in_area("r2"),
        Container::new("c4", "Top Tray").in_container("c3"),
        Container::new("c5", "Loose Box"),
    ];
    (areas, containers)
}

#[test]
fn well_formed_input_places_every_record_under_its_declared_parent() {
    let (areas, containers) = household();
    let tree = build_tree(&areas, &containers);

    assert_eq!(tree.node_count(), areas.len() + containers.len());
    assert!(tree.diagnostics().is_clean());

    for container in &containers {
        let summary = tree.summary(&container.id).unwrap();
        assert_eq!(summary.kind, NodeKind::Container);
        let expected = container.parent.as_ref().map(|parent| parent.id().to_string());
        assert_eq!(summary.placed_under, expected, "container {}", container.id);
    }

    let mut visited = 0;
    walk(tree.roots(), |_, _| {
        visited += 1;
        Visit::Continue
    });
    assert_eq!(visited, tree.node_count());
}

#[test]
fn roots_list_areas_then_top_level_containers() {
    let (areas, containers) = household();
    let tree = build_tree(&areas, &containers);
    let root_ids: Vec<&str> = tree.roots().iter().map(|node| node.id.as_str()).collect();
    assert_eq!(root_ids, vec!["r1", "r2", "c5"]);
    assert_eq!(tree.areas().count(), 2);
}

#[test]
fn dangling_references_are_promoted_not_dropped() {
    let containers = vec![
        Container::new("c1", "Shelf").in_container("missing-parent"),
        Container::new("c2", "Crate").in_area("missing-area"),
        Container::new("c3", "Bin").in_container("c1"),
    ];
    let tree = build_tree(&[], &containers);

    let root_ids: Vec<&str> = tree.roots().iter().map(|node| node.id.as_str()).collect();
    assert_eq!(root_ids, vec!["c1", "c2"]);
    assert_eq!(tree.roots()[0].children[0].id, "c3");
    assert_eq!(tree.diagnostics().orphans_promoted, 2);
    assert_eq!(
        tree.diagnostics().promoted_ids,
        vec!["c1".to_string(), "c2".to_string()]
    );
    assert_eq!(
        tree.roots()[0].declared_parent,
        Some(ParentRef::Container("missing-parent".to_string()))
    );
}

#[test]
fn duplicate_ids_keep_first_position_and_last_values() {
    let containers = vec![
        Container::new("c1", "Old Name"),
        Container::new("c2", "Other"),
        Container::new("c1", "New Name"),
    ];
    let tree = build_tree(&[], &containers);

    assert_eq!(tree.roots().len(), 2);
    assert_eq!(tree.roots()[0].id, "c1");
    assert_eq!(tree.roots()[0].name, "New Name");
    assert_eq!(tree.diagnostics().duplicate_ids, 1);
}

#[test]
fn mutual_parent_cycle_is_broken_and_kept_whole() {
    let containers = vec![
        Container::new("x", "X").in_container("y"),
        Container::new("y", "Y").in_container("x"),
    ];
    let tree = build_tree(&[], &containers);

    assert_eq!(tree.node_count(), 2);
    assert_eq!(tree.diagnostics().cycles_broken, 1);
    assert_eq!(tree.roots().len(), 1);
    assert_eq!(tree.roots()[0].id, "x");
    assert_eq!(tree.roots()[0].children[0].id, "y");
}

#[test]
fn tree_serializes_with_type_tags() {
    let (areas, containers) = household();
    let tree = build_tree(&areas, &containers);
    let value = serde_json::to_value(&tree).unwrap();

    assert_eq!(value["roots"][0]["type"], "room");
    assert_eq!(value["roots"][0]["kind"], "area");
    assert_eq!(value["roots"][0]["children"][0]["name"], "Cabinet");
    assert_eq!(value["diagnostics"]["orphans_promoted"], 0);
}

fn chain(depth: usize) -> Vec<Container> {
    (0..depth)
        .map(|level| {
            let container = Container::new(format!("c{level}"), format!("Level {level}"));
            match level {
                0 => container.in_area("r1"),
                _ => container.in_container(format!("c{}", level - 1)),
            }
        })
        .collect()
}

#[test]
fn very_deep_chain_builds_clones_and_drops() {
    const DEPTH: usize = 20_000;
    let areas = vec![Area::new("r1", "Basement")];
    let tree = build_tree(&areas, &chain(DEPTH));

    assert_eq!(tree.node_count(), DEPTH + 1);
    assert!(tree.diagnostics().is_clean());
    let deepest = format!("c{}", DEPTH - 1);
    assert_eq!(
        tree.summary(&deepest).and_then(|s| s.placed_under.as_deref()),
        Some(format!("c{}", DEPTH - 2).as_str())
    );
    assert_eq!(path_to(tree.roots(), &deepest).map(|path| path.len()), Some(DEPTH + 1));
    assert_eq!(total_sub_containers(tree.find("r1")), DEPTH);

    let copy = tree.roots()[0].clone();
    assert!(copy == tree.roots()[0]);
    drop(copy);
    drop(tree);
}

#[test]
fn json_export_refuses_nesting_past_the_limit() {
    let areas = vec![Area::new("r1", "Basement")];

    let shallow = build_tree(&areas, &chain(MAX_EXPORT_DEPTH - 1));
    assert!(serde_json::to_string(&shallow).is_ok());

    let deep = build_tree(&areas, &chain(MAX_EXPORT_DEPTH + 5));
    let err = serde_json::to_string(&deep).unwrap_err();
    assert!(err.to_string().contains("nested deeper than"));
}
