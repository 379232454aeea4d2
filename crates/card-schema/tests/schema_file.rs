use std::io::Write;

use card_core::enums::Task;
use card_schema::registry::schema_file_json_schema;
use card_schema::{SchemaError, SchemaRegistry, SectionSchema};
use pretty_assertions::assert_eq;

const MINIMAL: &str = r#"{
  "card_metadata": {
    "creation_date": {"label": "Creation date", "type": "date", "required": true}
  },
  "hw_and_sw": ["hw_and_sw_hardware_recommended"],
  "training_data": {
    "model_inputs": {"type": "select", "required": true},
    "url_info": {"type": "text"},
    "dose_grid": {"type": "text", "required": true, "model_types": ["Dose prediction"]}
  }
}"#;

#[test]
fn loads_schema_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();

    let registry = SchemaRegistry::from_path(file.path()).unwrap();
    assert_eq!(
        registry.section_names().collect::<Vec<_>>(),
        vec!["card_metadata", "hw_and_sw", "training_data"]
    );
    assert!(matches!(
        registry.section("hw_and_sw"),
        Some(SectionSchema::Keys(keys)) if keys == &["hw_and_sw_hardware_recommended"]
    ));

    let dose: Vec<&str> = registry
        .applicable_fields("training_data", Some(Task::DosePrediction))
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(dose, vec!["model_inputs", "url_info", "dose_grid"]);

    let other: Vec<&str> = registry
        .applicable_fields("training_data", Some(Task::Other))
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(other, vec!["model_inputs", "url_info"]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SchemaRegistry::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let err = SchemaRegistry::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}

#[test]
fn unknown_task_names_fail_validation() {
    let err = SchemaRegistry::from_json_str(
        r#"{"training_data": {"x": {"model_types": ["Classification"]}}}"#,
    )
    .unwrap_err();
    match err {
        SchemaError::ValidationFailed { errors } => assert!(!errors.is_empty()),
        other => panic!("expected ValidationFailed, got {other}"),
    }
}

#[test]
fn generated_json_schema_is_an_object_schema() {
    let schema = schema_file_json_schema().unwrap();
    assert_eq!(schema["type"], "object");
}
