use salvage_core::db::open_db_in_memory;
use salvage_core::{
    LocationService, LocationServiceError, LocationType, NewPart, PartService,
    SqliteLocationRepository, SqlitePartRepository, TemplateRegistry,
};

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn locations(conn: &rusqlite::Connection) -> LocationService<SqliteLocationRepository<'_>> {
    LocationService::new(SqliteLocationRepository::try_new(conn).unwrap())
}

#[test]
fn create_rejects_blank_name_and_missing_parent() {
    let conn = setup();
    let service = locations(&conn);

    assert!(matches!(
        service.create("   ", None, LocationType::Zone, ""),
        Err(LocationServiceError::InvalidName)
    ));
    assert!(matches!(
        service.create("Shelf", Some(99), LocationType::Shelf, ""),
        Err(LocationServiceError::ParentNotFound(99))
    ));

    let workshop = service
        .create(" Workshop ", None, LocationType::Zone, "ground floor")
        .unwrap();
    assert_eq!(workshop.name, "Workshop");
    assert_eq!(workshop.kind, LocationType::Zone);
    assert_eq!(workshop.parent_id, None);
}

#[test]
fn full_path_joins_names_from_root() {
    let conn = setup();
    let service = locations(&conn);

    let a = service.create("A", None, LocationType::Zone, "").unwrap();
    let b = service.create("B", Some(a.id), LocationType::Furniture, "").unwrap();
    let c = service.create("C", Some(b.id), LocationType::Box, "").unwrap();

    assert_eq!(service.full_path(c.id).unwrap(), "A > B > C");
    assert_eq!(service.full_path(a.id).unwrap(), "A");
    assert_eq!(service.describe(c.id).unwrap(), format!("A > B > C (#{})", c.id));
    assert!(matches!(
        service.full_path(404),
        Err(LocationServiceError::LocationNotFound(404))
    ));
}

#[test]
fn move_into_own_descendant_is_rejected() {
    let conn = setup();
    let service = locations(&conn);

    let a = service.create("A", None, LocationType::Zone, "").unwrap();
    let b = service.create("B", Some(a.id), LocationType::Furniture, "").unwrap();
    let c = service.create("C", Some(b.id), LocationType::Box, "").unwrap();

    let err = service.move_location(a.id, Some(c.id)).unwrap_err();
    assert!(matches!(
        err,
        LocationServiceError::CycleDetected { location_id, parent_id }
            if location_id == a.id && parent_id == c.id
    ));
    assert!(matches!(
        service.move_location(b.id, Some(b.id)),
        Err(LocationServiceError::CycleDetected { .. })
    ));
    assert_eq!(service.full_path(c.id).unwrap(), "A > B > C");
}

#[test]
fn move_to_root_and_sideways_succeeds() {
    let conn = setup();
    let service = locations(&conn);

    let a = service.create("A", None, LocationType::Zone, "").unwrap();
    let b = service.create("B", Some(a.id), LocationType::Furniture, "").unwrap();
    let other = service.create("Garage", None, LocationType::Zone, "").unwrap();

    service.move_location(b.id, None).unwrap();
    assert_eq!(service.get(b.id).unwrap().parent_id, None);

    service.move_location(b.id, Some(other.id)).unwrap();
    assert_eq!(service.full_path(b.id).unwrap(), "Garage > B");

    assert!(matches!(
        service.move_location(b.id, Some(777)),
        Err(LocationServiceError::ParentNotFound(777))
    ));
    assert!(matches!(
        service.move_location(888, None),
        Err(LocationServiceError::LocationNotFound(888))
    ));
}

#[test]
fn delete_is_blocked_by_parts_until_they_move() {
    let conn = setup();
    let service = locations(&conn);
    let registry = TemplateRegistry::default();
    let parts = PartService::new(
        SqlitePartRepository::try_new(&conn).unwrap(),
        SqliteLocationRepository::try_new(&conn).unwrap(),
        &registry,
    );

    let bin = service.create("Bin 1", None, LocationType::Box, "").unwrap();
    let spare = service.create("Bin 2", None, LocationType::Box, "").unwrap();
    let part = parts
        .add_part(NewPart::new("", "M3 screw").with_location(bin.id.to_string()))
        .unwrap();
    assert_eq!(part.location_id, Some(bin.id));

    let err = service.delete(bin.id).unwrap_err();
    assert!(matches!(
        err,
        LocationServiceError::LocationNotEmpty { part_count: 1 }
    ));

    parts.set_location(part.id, spare.id).unwrap();
    service.delete(bin.id).unwrap();
    assert!(matches!(
        service.get(bin.id),
        Err(LocationServiceError::LocationNotFound(_))
    ));
}

#[test]
fn delete_is_blocked_by_children() {
    let conn = setup();
    let service = locations(&conn);

    let cabinet = service.create("Cabinet", None, LocationType::Furniture, "").unwrap();
    let drawer = service
        .create("Drawer", Some(cabinet.id), LocationType::Box, "")
        .unwrap();

    assert!(matches!(
        service.delete(cabinet.id),
        Err(LocationServiceError::LocationHasChildren { child_count: 1 })
    ));
    service.delete(drawer.id).unwrap();
    service.delete(cabinet.id).unwrap();
    assert!(matches!(
        service.delete(cabinet.id),
        Err(LocationServiceError::LocationNotFound(_))
    ));
}

#[test]
fn parts_count_and_tree_include_descendants() {
    let conn = setup();
    let service = locations(&conn);
    let registry = TemplateRegistry::default();
    let parts = PartService::new(
        SqlitePartRepository::try_new(&conn).unwrap(),
        SqliteLocationRepository::try_new(&conn).unwrap(),
        &registry,
    );

    let zone = service.create("Workshop", None, LocationType::Zone, "").unwrap();
    let shelf = service.create("Shelf", Some(zone.id), LocationType::Shelf, "").unwrap();
    let left = service.create("Left box", Some(shelf.id), LocationType::Box, "").unwrap();
    let right = service.create("Right box", Some(shelf.id), LocationType::Box, "").unwrap();

    parts
        .add_part(NewPart::new("", "Relay").with_location("left box"))
        .unwrap();
    parts
        .add_part(NewPart::new("", "Fuse").with_location(right.id.to_string()))
        .unwrap();
    parts
        .add_part(NewPart::new("", "Cable").with_location("Workshop"))
        .unwrap();

    assert_eq!(service.parts_count(zone.id).unwrap(), 3);
    assert_eq!(service.parts_count(shelf.id).unwrap(), 2);
    assert_eq!(service.parts_count(left.id).unwrap(), 1);

    let tree = service.tree().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].parts_count, 3);
    let shelf_node = &tree[0].children[0];
    let child_names: Vec<&str> = shelf_node
        .children
        .iter()
        .map(|node| node.location.name.as_str())
        .collect();
    assert_eq!(child_names, vec!["Left box", "Right box"]);

    let roots = service.list_children(None).unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(service.resolve("SHELF").unwrap().id, shelf.id);
    assert_eq!(service.resolve(&left.id.to_string()).unwrap().id, left.id);
    assert!(matches!(
        service.resolve("attic"),
        Err(LocationServiceError::UnknownReference(_))
    ));
}

#[test]
fn corrupt_cycle_in_storage_still_terminates() {
    let conn = setup();
    let service = locations(&conn);

    let a = service.create("A", None, LocationType::Zone, "").unwrap();
    let b = service.create("B", Some(a.id), LocationType::Box, "").unwrap();
    let outside = service.create("Outside", None, LocationType::Zone, "").unwrap();
    conn.execute(
        "UPDATE locations SET parent_id = ?1 WHERE id = ?2;",
        [b.id, a.id],
    )
    .unwrap();

    let path = service.full_path(b.id).unwrap();
    assert_eq!(path, "A > B");
    assert_eq!(service.parts_count(a.id).unwrap(), 0);
    service.move_location(outside.id, Some(a.id)).unwrap();
    assert_eq!(service.get(outside.id).unwrap().parent_id, Some(a.id));
    assert!(matches!(
        service.move_location(a.id, Some(outside.id)),
        Err(LocationServiceError::CycleDetected { .. })
    ));
}

#[test]
fn paths_for_skips_unknown_ids() {
    let conn = setup();
    let service = locations(&conn);

    let a = service.create("A", None, LocationType::Zone, "").unwrap();
    let b = service.create("B", Some(a.id), LocationType::Box, "").unwrap();

    let paths = service.paths_for([b.id, 999, a.id, b.id]).unwrap();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[&b.id], "A > B");
    assert_eq!(paths[&a.id], "A");
}
