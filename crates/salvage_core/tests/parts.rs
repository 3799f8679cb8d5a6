use salvage_core::db::open_db_in_memory;
use salvage_core::template::FieldDefinition;
use salvage_core::{
    LocationService, LocationType, NewPart, PartQuery, PartSearchService, PartService,
    PartServiceError, PropValue, SqliteLocationRepository, SqlitePartRepository, Template,
    TemplateError, TemplateRegistry, UnitDomain, UnitError,
};
use std::fs;

const BEARING_YAML: &str = r#"
name: bearing
description: Ball bearing
fields:
  d_int: { required: true, domain: dimension, unit: mm }
  d_ext: { required: true, domain: dimension, unit: mm }
  width: { domain: dimension, unit: mm }
  brand: {}
"#;

fn bearing_registry(strict: bool) -> TemplateRegistry {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bearing.yaml"), BEARING_YAML).unwrap();
    TemplateRegistry::load_dir(dir.path(), strict).unwrap()
}

fn part_service<'a>(
    conn: &'a rusqlite::Connection,
    registry: &'a TemplateRegistry,
) -> PartService<'a, SqlitePartRepository<'a>, SqliteLocationRepository<'a>> {
    PartService::new(
        SqlitePartRepository::try_new(conn).unwrap(),
        SqliteLocationRepository::try_new(conn).unwrap(),
        registry,
    )
}

#[test]
fn bearing_is_normalized_stored_and_found_by_range() {
    let conn = open_db_in_memory().unwrap();
    let registry = bearing_registry(true);
    let parts = part_service(&conn, &registry);

    let part = parts
        .add_part(
            NewPart::new("bearing", "6001-2RS")
                .with_prop("d_int", "1cm")
                .with_prop("d_ext", 32i64)
                .with_prop("width", 10i64)
                .with_prop("brand", "SKF"),
        )
        .unwrap();

    assert_eq!(part.props["d_int"], PropValue::Number(10.0));
    assert_eq!(part.props["d_ext"], PropValue::Number(32.0));
    assert_eq!(part.props["width"], PropValue::Number(10.0));
    assert_eq!(part.props["brand"], PropValue::from("SKF"));

    let stored = parts.get(part.id).unwrap();
    assert_eq!(stored, part);

    let search = PartSearchService::new(
        SqlitePartRepository::try_new(&conn).unwrap(),
        SqliteLocationRepository::try_new(&conn).unwrap(),
    );
    let hits = search
        .search_local(&PartQuery::parse("", "", "d_int:9.5..10.5").unwrap())
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, part.id);
    assert_eq!(hits[0].source, "local");

    let misses = search
        .search_local(&PartQuery::parse("", "", "d_int:11..12").unwrap())
        .unwrap();
    assert!(misses.is_empty());
}

#[test]
fn missing_required_field_rejects_the_whole_part() {
    let conn = open_db_in_memory().unwrap();
    let registry = bearing_registry(true);
    let parts = part_service(&conn, &registry);

    let err = parts
        .add_part(NewPart::new("bearing", "half bearing").with_prop("d_int", "10mm"))
        .unwrap_err();
    assert!(matches!(
        err,
        PartServiceError::Template(TemplateError::MissingRequiredField { ref field, .. })
            if field == "d_ext"
    ));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM parts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn strict_registry_rejects_unknown_types() {
    let conn = open_db_in_memory().unwrap();
    let strict = bearing_registry(true);
    let err = part_service(&conn, &strict)
        .add_part(NewPart::new("gearbox", "Worm gear"))
        .unwrap_err();
    assert!(matches!(
        err,
        PartServiceError::Template(TemplateError::UnknownType(_))
    ));

    let lenient = bearing_registry(false);
    let part = part_service(&conn, &lenient)
        .add_part(NewPart::new("gearbox", "Worm gear"))
        .unwrap();
    assert_eq!(part.type_name, "gearbox");
}

#[test]
fn unknown_unit_aborts_with_field_name() {
    let conn = open_db_in_memory().unwrap();
    let registry = TemplateRegistry::default();
    let parts = part_service(&conn, &registry);

    let err = parts
        .add_part(
            NewPart::new("", "Mystery shaft")
                .with_prop("length", "12 furlongs")
                .with_prop("d_int", "8mm"),
        )
        .unwrap_err();
    match err {
        PartServiceError::Normalize(err) => {
            assert_eq!(err.field, "length");
            assert!(matches!(err.error, UnitError::UnknownUnit { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_domain_unit_is_stored_unless_check_is_enabled() {
    let conn = open_db_in_memory().unwrap();
    let registry = bearing_registry(false);

    let lenient = part_service(&conn, &registry);
    let part = lenient
        .add_part(
            NewPart::new("bearing", "odd bearing")
                .with_prop("d_int", "10V")
                .with_prop("d_ext", 30i64),
        )
        .unwrap();
    assert_eq!(part.props["d_int"], PropValue::Number(10.0));

    let strict = part_service(&conn, &registry).with_unit_domain_check(true);
    let err = strict
        .add_part(
            NewPart::new("bearing", "odd bearing")
                .with_prop("d_int", "10V")
                .with_prop("d_ext", 30i64),
        )
        .unwrap_err();
    match err {
        PartServiceError::Normalize(err) => {
            assert_eq!(err.field, "d_int");
            assert_eq!(
                err.error,
                UnitError::IncompatibleUnit {
                    field: "d_int".to_string(),
                    unit: "V".to_string(),
                    expected: UnitDomain::Dimension,
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn template_default_unit_converts_bare_numbers() {
    let conn = open_db_in_memory().unwrap();
    let registry = TemplateRegistry::from_templates(
        [Template::new("hose").with_field(
            "length",
            FieldDefinition {
                required: true,
                domain: Some(UnitDomain::Dimension),
                default_unit: Some("m".to_string()),
            },
        )],
        true,
    );
    let part = part_service(&conn, &registry)
        .add_part(NewPart::new("hose", "Garden hose").with_prop("length", 2.5))
        .unwrap();
    assert_eq!(part.props["length"], PropValue::Number(2500.0));
}

#[test]
fn blank_name_and_unknown_location_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let registry = TemplateRegistry::default();
    let parts = part_service(&conn, &registry);

    assert!(matches!(
        parts.add_part(NewPart::new("", "  ")),
        Err(PartServiceError::InvalidName)
    ));
    assert!(matches!(
        parts.add_part(NewPart::new("", "Relay").with_location("attic")),
        Err(PartServiceError::LocationNotFound(reference)) if reference == "attic"
    ));
}

#[test]
fn part_location_can_be_set_and_cleared() {
    let conn = open_db_in_memory().unwrap();
    let registry = TemplateRegistry::default();
    let parts = part_service(&conn, &registry);
    let locations = LocationService::new(SqliteLocationRepository::try_new(&conn).unwrap());

    let drawer = locations
        .create("Drawer", None, LocationType::Box, "")
        .unwrap();
    let part = parts.add_part(NewPart::new("", "Capacitor")).unwrap();
    assert_eq!(part.location_id, None);

    parts.set_location(part.id, drawer.id).unwrap();
    assert_eq!(parts.get(part.id).unwrap().location_id, Some(drawer.id));

    parts.clear_location(part.id).unwrap();
    assert_eq!(parts.get(part.id).unwrap().location_id, None);

    assert!(matches!(
        parts.set_location(999, drawer.id),
        Err(PartServiceError::PartNotFound(999))
    ));
    assert!(matches!(
        parts.set_location(part.id, 999),
        Err(PartServiceError::LocationNotFound(_))
    ));
    assert!(matches!(
        parts.clear_location(999),
        Err(PartServiceError::PartNotFound(999))
    ));
}
