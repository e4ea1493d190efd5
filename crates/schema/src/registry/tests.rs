//! Tests for the schema registry.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use super::*;

const LINE_SCHEMA: &str = r#"{
    "properties": {
        "kind": { "const": "Line" },
        "title": { "type": "string" },
        "show_legend": { "type": "boolean" }
    },
    "required": ["title", "show_legend"]
}"#;

const GAUGE_SCHEMA: &str = r#"{
    "properties": {
        "kind": { "const": "Gauge" },
        "title": { "type": "string" },
        "max": { "type": "number" }
    },
    "required": ["title"]
}"#;

fn temp_registry(files: &[(&str, &str)]) -> (TempDir, SchemaRegistry) {
    let dir = TempDir::new().expect("create tempdir");
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    let registry = SchemaRegistry::open(dir.path().to_path_buf()).expect("open registry");
    (dir, registry)
}

#[test]
fn load_registers_every_wellformed_kind() {
    let (_dir, registry) = temp_registry(&[
        ("line.json", LINE_SCHEMA),
        ("gauge.json", GAUGE_SCHEMA),
    ]);

    let snapshot = registry.current();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.kinds(), vec!["Gauge", "Line"]);
    assert_eq!(snapshot.get("Line").unwrap().kind(), "Line");
    assert!(snapshot.get("Bar").is_none());
}

#[test]
fn duplicate_kind_keeps_first_loaded_file() {
    let duplicate = LINE_SCHEMA.replace("show_legend", "other_field");
    let (_dir, registry) = temp_registry(&[
        ("a_line.json", LINE_SCHEMA),
        ("b_line.json", &duplicate),
    ]);

    let snapshot = registry.current();
    assert_eq!(snapshot.len(), 1);
    // Sorted filename order: a_line.json wins.
    assert!(snapshot
        .get("Line")
        .unwrap()
        .source()
        .ends_with("a_line.json"));

    let report = registry.reload().unwrap();
    let failed: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| match &o.status {
            LoadStatus::Failed { reason } => Some(reason.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].contains("duplicate kind 'Line'"));
}

#[test]
fn malformed_file_does_not_affect_the_rest_of_the_batch() {
    let (_dir, registry) = temp_registry(&[
        ("broken.json", "{ this is not json"),
        ("line.json", LINE_SCHEMA),
        ("kindless.json", r#"{ "properties": { "title": { "type": "string" } } }"#),
    ]);

    let snapshot = registry.current();
    assert_eq!(snapshot.kinds(), vec!["Line"]);

    let report = registry.reload().unwrap();
    let failed = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, LoadStatus::Failed { .. }))
        .count();
    assert_eq!(failed, 2);
}

#[test]
fn dotfiles_and_non_json_files_are_skipped() {
    let (_dir, registry) = temp_registry(&[
        ("line.json", LINE_SCHEMA),
        (".hidden.json", GAUGE_SCHEMA),
        ("readme.txt", "not a schema"),
    ]);

    assert_eq!(registry.current().kinds(), vec!["Line"]);

    let report = registry.reload().unwrap();
    let skipped = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, LoadStatus::Skipped { .. }))
        .count();
    assert_eq!(skipped, 2);
}

#[test]
fn open_fails_when_directory_is_missing() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = SchemaRegistry::open(missing).unwrap_err();
    assert!(matches!(err, RegistryError::Enumerate { .. }));
}

#[test]
fn failed_reload_retains_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let schemas = dir.path().join("schemas");
    fs::create_dir(&schemas).unwrap();
    fs::write(schemas.join("line.json"), LINE_SCHEMA).unwrap();

    let registry = SchemaRegistry::open(schemas.clone()).unwrap();
    assert_eq!(registry.current().kinds(), vec!["Line"]);

    // Directory disappears out from under the registry.
    fs::remove_dir_all(&schemas).unwrap();
    assert!(registry.reload().is_err());

    // Old generation still served.
    assert_eq!(registry.current().kinds(), vec!["Line"]);
}

#[test]
fn successful_reload_replaces_snapshot_wholesale() {
    let (dir, registry) = temp_registry(&[("line.json", LINE_SCHEMA)]);
    assert_eq!(registry.current().kinds(), vec!["Line"]);

    fs::remove_file(dir.path().join("line.json")).unwrap();
    fs::write(dir.path().join("gauge.json"), GAUGE_SCHEMA).unwrap();

    let report = registry.reload().unwrap();
    assert_eq!(report.kinds, vec!["Gauge"]);

    let snapshot = registry.current();
    assert!(snapshot.get("Line").is_none(), "removed kind must be gone");
    assert!(snapshot.get("Gauge").is_some(), "added kind must be present");
}

#[test]
fn captured_snapshot_survives_a_concurrent_reload() {
    let (dir, registry) = temp_registry(&[("line.json", LINE_SCHEMA)]);

    // A validation run captures the snapshot once at entry.
    let captured = registry.current();

    fs::remove_file(dir.path().join("line.json")).unwrap();
    fs::write(dir.path().join("gauge.json"), GAUGE_SCHEMA).unwrap();
    registry.reload().unwrap();

    // The captured generation is untouched by the publish.
    assert_eq!(captured.kinds(), vec!["Line"]);
    assert!(captured.get("Line").is_some());
    assert_eq!(registry.current().kinds(), vec!["Gauge"]);
}

#[test]
fn compiled_schema_checks_panels() {
    let (_dir, registry) = temp_registry(&[("line.json", LINE_SCHEMA)]);
    let snapshot = registry.current();
    let schema = snapshot.get("Line").unwrap();

    let good = json!({ "kind": "Line", "title": "CPU", "show_legend": true });
    let bad = json!({ "kind": "Line", "title": "CPU", "show_legend": "yes" });
    assert!(schema.check(&good).is_ok());
    assert!(schema.check(&bad).is_err());
}
