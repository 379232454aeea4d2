//! End-to-end runs of the `mcard` binary against a temporary session.

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn mcard(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcard"))
        .current_dir(dir)
        .env_remove("MODELCARD_LOG")
        .env_remove("MODELCARD_GENERAL__STRICT")
        .env_remove("MODELCARD_GENERAL__DEFAULT_TASK")
        .env_remove("MODELCARD_SCHEMA__PATH")
        .args(args)
        .output()
        .expect("mcard should run")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn load_then_export_round_trips_a_document() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("card.json"),
        json!({
            "task": "Segmentation",
            "card_metadata": {"creation_date": "2024-01-15", "contributor_name": "Jane"},
            "evaluations": [{"name": "Site A", "total_size": "40"}],
            "other_considerations": "not a section"
        })
        .to_string(),
    )
    .unwrap();

    let report = stdout_json(&mcard(dir.path(), &["load", "card.json", "-s", "session.json"]));
    assert_eq!(report["applied"], json!(["task", "card_metadata", "evaluations"]));
    assert_eq!(report["failures"][0]["section"], json!("other_considerations"));
    assert!(dir.path().join("session.json").exists());

    let exported = stdout_json(&mcard(dir.path(), &["export", "session.json"]));
    assert_eq!(exported["task"], json!("Segmentation"));
    assert_eq!(exported["card_metadata"]["creation_date"], json!("20240115"));
    assert_eq!(exported["evaluations"][0]["total_size"], json!("40"));
}

#[test]
fn validate_reports_missing_fields_and_strict_mode_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("session.json"),
        json!({"task": "Other", "card_metadata_contributor_email": "nope"}).to_string(),
    )
    .unwrap();

    let response = stdout_json(&mcard(dir.path(), &["validate", "session.json"]));
    let missing = response["missing"].as_array().unwrap();
    assert!(missing.iter().any(|item| item["label"] == json!("Creation Date")));
    assert_eq!(
        response["format_violations"][0]["label"],
        json!("Contributor Email")
    );

    let strict = mcard(dir.path(), &["validate", "session.json", "--strict"]);
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).starts_with("mcard error:"));
}

#[test]
fn task_flag_cannot_switch_a_chosen_task() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("session.json"),
        json!({"task": "Other"}).to_string(),
    )
    .unwrap();

    let output = mcard(dir.path(), &["--task", "Segmentation", "export", "session.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Task already selected"));

    let same = mcard(dir.path(), &["--task", "other", "export", "session.json"]);
    assert_eq!(stdout_json(&same)["task"], json!("Other"));
}

#[test]
fn schema_lists_task_fields() {
    let dir = tempfile::tempdir().unwrap();
    let rows = stdout_json(&mcard(
        dir.path(),
        &["--task", "Segmentation", "schema", "--section", "model_basic_information"],
    ));
    let fields: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|row| row["field"].as_str())
        .collect();
    assert!(fields.contains(&"segmentation_targets"));
    assert!(!fields.contains(&"dose_prediction_plan_type"));

    let unknown = mcard(dir.path(), &["schema", "--section", "nope"]);
    assert!(!unknown.status.success());
}
