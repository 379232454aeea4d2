//! Serde wire names and JsonSchema validation for the shared value types.

use card_core::enums::{FieldType, IoSource, MetricGroup, Task};
use card_core::report::MissingFieldReport;
use card_core::store::{FlatStore, UploadRecord};
use pretty_assertions::assert_eq;
use schemars::schema_for;
use serde_json::json;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! wire_name_and_validate {
    ($name:ident, $ty:ty, $value:expr, $wire:expr) => {
        #[test]
        fn $name() {
            let value: $ty = $value;
            let instance = serde_json::to_value(value).unwrap();
            assert_eq!(instance, json!($wire));

            let recovered: $ty = serde_json::from_value(instance.clone()).unwrap();
            assert_eq!(recovered, value);

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

wire_name_and_validate!(
    task_uses_display_name,
    Task,
    Task::ImageToImageTranslation,
    "Image-to-Image translation"
);
wire_name_and_validate!(
    dose_task_uses_display_name,
    Task,
    Task::DosePrediction,
    "Dose prediction"
);
wire_name_and_validate!(field_type_is_lowercase, FieldType, FieldType::Image, "image");
wire_name_and_validate!(
    io_source_is_snake_case,
    IoSource,
    IoSource::ModelOutputs,
    "model_outputs"
);
wire_name_and_validate!(
    metric_group_is_its_field_name,
    MetricGroup,
    MetricGroup::DoseDmSeg,
    "type_dose_dm_seg"
);

#[test]
fn unknown_task_fails_schema_validation() {
    let schema = serde_json::to_value(schema_for!(Task)).unwrap();
    let errors = validate_against_schema(&schema, &json!("Classification"));
    assert!(!errors.is_empty());
}

#[test]
fn lowercase_task_aliases_deserialize() {
    let task: Task = serde_json::from_value(json!("segmentation")).unwrap();
    assert_eq!(task, Task::Segmentation);
}

#[test]
fn flat_store_serializes_as_a_plain_map() {
    let mut store = FlatStore::new();
    store.insert("task", json!("Segmentation"));
    store.record_upload(
        "technical_specifications_model_pipeline_figure",
        &UploadRecord {
            name: "pipeline.png".into(),
            path: "uploads/pipeline.png".into(),
        },
    );
    let text = serde_json::to_string(&store).unwrap();
    assert_eq!(
        text,
        r#"{"task":"Segmentation","render_uploads":{"technical_specifications_model_pipeline_figure":{"name":"pipeline.png","path":"uploads/pipeline.png"}}}"#
    );
    let back: FlatStore = serde_json::from_str(&text).unwrap();
    assert_eq!(back, store);
    assert_eq!(back.task(), Some(Task::Segmentation));
}

#[test]
fn missing_field_report_serializes_as_a_list() {
    let mut report = MissingFieldReport::new();
    report.push("card_metadata", "Creation Date");
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!([{"section": "card_metadata", "label": "Creation Date"}])
    );
}
