//! Structured document back into the flat store.
//!
//! Each top-level section is expanded into a staged patch first. The patch
//! is committed only when the whole section expanded cleanly; a malformed
//! section is reported and leaves the store untouched.
//!
//! Date-like fields go through a seed-once guard: when the field's base key
//! or its widget key already exists, hydration leaves both alone so an
//! author's in-progress edit survives a repeated load.

use card_core::dates::{canonical_from_value, is_canonical_date_value, parse_canonical_date, widget_date};
use card_core::enums::{IoSource, Task};
use card_core::keys::{self, Address, ModalityScope};
use card_core::ordered::Document;
use card_core::store::{FlatStore, json_kind};
use card_schema::tables;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{HydrateError, ImportFormatError};
use crate::groups::{ArchitectureInstance, EvaluationInstance, RepeatedGroup};

/// One rejected top-level section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFailure {
    pub section: String,
    pub reason: String,
}

/// Outcome of a document load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HydrateReport {
    /// Sections committed to the store, in document order.
    pub applied: Vec<String>,
    /// Sections rejected, with the reason, in document order.
    pub failures: Vec<SectionFailure>,
}

impl HydrateReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load `document` into `store`, section by section.
///
/// # Errors
///
/// Returns `HydrateError::NotAnObject` if `document` is not a JSON object.
/// Problems inside a section are collected in the report instead.
pub fn hydrate(store: &mut FlatStore, document: &Value) -> Result<HydrateReport, HydrateError> {
    let Value::Object(sections) = document else {
        return Err(HydrateError::NotAnObject(json_kind(document)));
    };

    let mut report = HydrateReport::default();
    for (section, content) in sections {
        let mut patch = Patch::new(store);
        let outcome = match section.as_str() {
            keys::TASK => hydrate_task(&mut patch, content),
            tables::TRAINING_DATA => hydrate_training(&mut patch, content),
            tables::EVALUATIONS_KEY => hydrate_evaluations(&mut patch, content),
            tables::TECHNICAL_SPECIFICATIONS => hydrate_technical(&mut patch, content),
            _ => hydrate_generic(&mut patch, section, content),
        };
        match outcome {
            Ok(()) => {
                let writes = patch.into_writes();
                tracing::debug!(section = %section, keys = writes.len(), "hydrate: section applied");
                for (key, value) in writes {
                    store.insert(key, value);
                }
                report.applied.push(section.clone());
            }
            Err(reason) => {
                tracing::warn!(section = %section, %reason, "hydrate: section rejected");
                report.failures.push(SectionFailure {
                    section: section.clone(),
                    reason: reason.to_string(),
                });
            }
        }
    }
    Ok(report)
}

type SectionResult = Result<(), ImportFormatError>;

/// Writes staged against a read-only view of the store.
struct Patch<'s> {
    store: &'s FlatStore,
    writes: Document,
}

impl<'s> Patch<'s> {
    fn new(store: &'s FlatStore) -> Self {
        Self {
            store,
            writes: Document::new(),
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.writes.contains_key(key) || self.store.contains(key)
    }

    fn set(&mut self, key: String, value: Value) {
        self.writes.insert(key, value);
    }

    fn set_with_shadow(&mut self, key: String, value: &Value) {
        if value.is_array() {
            self.writes.insert(keys::list_shadow(&key), value.clone());
        }
        self.writes.insert(key, value.clone());
    }

    /// Seed a date field once.
    ///
    /// Valid dates store `YYYYMMDD` at `key` and ISO at its widget key. Empty
    /// and null values are stored as-is. Anything else stores null, unless
    /// `keep_raw` is set, in which case the raw value is kept for display.
    fn seed_date(&mut self, key: String, value: &Value, keep_raw: bool) {
        let widget = keys::widget_key(&key);
        if self.exists(&key) || self.exists(&widget) {
            return;
        }
        let parsed = canonical_from_value(value)
            .and_then(|canonical| parse_canonical_date(&canonical).map(|date| (canonical, date)));
        let (base, widget_value) = match parsed {
            Some((canonical, date)) => (Value::String(canonical), Value::String(widget_date(date))),
            None if is_blank(value) || keep_raw => (value.clone(), Value::Null),
            None => (Value::Null, Value::Null),
        };
        self.writes.insert(key, base);
        self.writes.insert(widget, widget_value);
    }

    fn into_writes(self) -> Document {
        self.writes
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn expect_object(value: &Value) -> Result<&Map<String, Value>, ImportFormatError> {
    value.as_object().ok_or(ImportFormatError::WrongShape {
        expected: "object",
        found: json_kind(value),
    })
}

fn expect_array(value: &Value) -> Result<&Vec<Value>, ImportFormatError> {
    value.as_array().ok_or(ImportFormatError::WrongShape {
        expected: "array",
        found: json_kind(value),
    })
}

// ---- sections ----

fn hydrate_task(patch: &mut Patch<'_>, content: &Value) -> SectionResult {
    let name = content.as_str().ok_or(ImportFormatError::WrongShape {
        expected: "string",
        found: json_kind(content),
    })?;
    let task: Task = name
        .parse()
        .map_err(|_| ImportFormatError::UnknownTask(name.to_string()))?;
    patch.set(keys::TASK.to_string(), Value::from(task.as_str()));
    Ok(())
}

fn hydrate_training(patch: &mut Patch<'_>, content: &Value) -> SectionResult {
    let fields = expect_object(content)?;
    for (field, value) in fields {
        if field == tables::IO_SPECIFICATIONS {
            hydrate_io_entries(patch, &ModalityScope::Training, value)?;
        } else {
            patch.set_with_shadow(Address::plain(tables::TRAINING_DATA, field.as_str()).encode(), value);
        }
    }
    Ok(())
}

/// Expand `[{entry, source, <field>...}]` into per-modality keys of `scope`.
fn hydrate_io_entries(patch: &mut Patch<'_>, scope: &ModalityScope, value: &Value) -> SectionResult {
    for (index, io) in expect_array(value)?.iter().enumerate() {
        let io = expect_object(io)?;
        let entry = io
            .get(tables::MODALITY_ENTRY)
            .and_then(Value::as_str)
            .ok_or(ImportFormatError::MissingIdentifier {
                index,
                field: tables::MODALITY_ENTRY,
            })?;
        let source_name = io
            .get(tables::MODALITY_SOURCE)
            .and_then(Value::as_str)
            .ok_or(ImportFormatError::MissingIdentifier {
                index,
                field: tables::MODALITY_SOURCE,
            })?;
        let source: IoSource = source_name
            .parse()
            .map_err(|_| ImportFormatError::UnknownSource {
                index,
                source_name: source_name.to_string(),
            })?;
        for (field, field_value) in io {
            if field == tables::MODALITY_ENTRY || field == tables::MODALITY_SOURCE {
                continue;
            }
            let key = Address::modality(scope.clone(), entry, source, field.as_str()).encode();
            patch.set(key, field_value.clone());
        }
    }
    Ok(())
}

fn hydrate_evaluations(patch: &mut Patch<'_>, content: &Value) -> SectionResult {
    let entries = expect_array(content)?;
    let mut named: Vec<(EvaluationInstance, &Map<String, Value>)> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let entry = expect_object(entry)?;
        let name = entry
            .get(tables::ENTRY_NAME)
            .and_then(Value::as_str)
            .ok_or(ImportFormatError::MissingIdentifier {
                index,
                field: tables::ENTRY_NAME,
            })?;
        let evaluation = EvaluationInstance::new(name);
        if let Some((clash, _)) = named
            .iter()
            .find(|(other, _)| keys::slugs_overlap(&other.slug, &evaluation.slug))
        {
            return Err(ImportFormatError::OverlappingEvaluations {
                first: clash.name.clone(),
                second: evaluation.name,
            });
        }
        named.push((evaluation, entry));
    }

    let names: Vec<Value> = named
        .iter()
        .map(|(evaluation, _)| Value::from(evaluation.name.as_str()))
        .collect();
    patch.set(keys::EVALUATION_FORMS.to_string(), Value::Array(names));

    for (evaluation, entry) in &named {
        for (field, value) in *entry {
            if field == tables::ENTRY_NAME {
                continue;
            }
            let key = evaluation.key(field);
            if field == tables::IO_SPECIFICATIONS {
                let scope = ModalityScope::Evaluation {
                    slug: evaluation.slug.clone(),
                };
                hydrate_io_entries(patch, &scope, value)?;
            } else if field.starts_with("type_") && value.is_array() {
                hydrate_metric_group(patch, evaluation, field, value)?;
            } else if field.to_lowercase().contains("date") {
                patch.seed_date(key, value, false);
            } else if is_canonical_date_value(value) {
                patch.seed_date(key, value, true);
            } else {
                patch.set(key, value.clone());
            }
        }
    }
    Ok(())
}

/// `type_*: [{name, <field>...}]` becomes the selector list, its `_list`
/// shadow, and one key per metric sub-field.
fn hydrate_metric_group(
    patch: &mut Patch<'_>,
    evaluation: &EvaluationInstance,
    group: &str,
    value: &Value,
) -> SectionResult {
    let metrics = expect_array(value)?;
    let mut names = Vec::with_capacity(metrics.len());
    for (index, metric) in metrics.iter().enumerate() {
        let name = metric
            .get(tables::ENTRY_NAME)
            .and_then(Value::as_str)
            .ok_or_else(|| ImportFormatError::MissingMetricName {
                evaluation: evaluation.name.clone(),
                group: group.to_string(),
                index,
            })?;
        names.push(Value::from(name));
        if let Some(fields) = metric.as_object() {
            for (field, field_value) in fields {
                if field == tables::ENTRY_NAME {
                    continue;
                }
                let key = Address::metric(evaluation.slug.clone(), name, field.as_str()).encode();
                patch.set(key, field_value.clone());
            }
        }
    }
    patch.set_with_shadow(evaluation.key(group), &Value::Array(names));
    Ok(())
}

fn hydrate_technical(patch: &mut Patch<'_>, content: &Value) -> SectionResult {
    let fields = expect_object(content)?;
    for (field, value) in fields {
        match (field.as_str(), value) {
            (tables::LEARNING_ARCHITECTURES_KEY, Value::Array(architectures)) => {
                let mut forms = Map::new();
                for (index, arch) in architectures.iter().enumerate() {
                    let instance = ArchitectureInstance { index };
                    forms.insert(instance.form_name(), Value::Object(Map::new()));
                    for (arch_field, arch_value) in expect_object(arch)? {
                        if arch_field == tables::ARCHITECTURE_ID {
                            continue;
                        }
                        patch.set(instance.key(arch_field), arch_value.clone());
                    }
                }
                patch.set(keys::ARCHITECTURE_FORMS.to_string(), Value::Object(forms));
            }
            (tables::HW_AND_SW, Value::Object(block)) => {
                for (sub, sub_value) in block {
                    patch.set(
                        Address::plain(tables::HW_AND_SW, sub.as_str()).encode(),
                        sub_value.clone(),
                    );
                }
            }
            _ => patch.set_with_shadow(
                Address::plain(tables::TECHNICAL_SPECIFICATIONS, field.as_str()).encode(),
                value,
            ),
        }
    }
    Ok(())
}

fn hydrate_generic(patch: &mut Patch<'_>, section: &str, content: &Value) -> SectionResult {
    let fields = expect_object(content)?;
    for (field, value) in fields {
        let key = Address::plain(section, field.as_str()).encode();
        if field.ends_with("date") {
            if value.is_array() {
                patch.set(keys::list_shadow(&key), value.clone());
            }
            patch.seed_date(key, value, false);
        } else {
            patch.set_with_shadow(key, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn load(document: Value) -> (FlatStore, HydrateReport) {
        let mut store = FlatStore::new();
        let report = hydrate(&mut store, &document).unwrap();
        (store, report)
    }

    #[test]
    fn rejects_non_object_documents() {
        let mut store = FlatStore::new();
        let err = hydrate(&mut store, &json!(["card_metadata"])).unwrap_err();
        assert!(err.to_string().contains("array"));
        assert!(store.is_empty());
    }

    #[test]
    fn generic_sections_copy_fields_and_shadow_lists() {
        let (store, report) = load(json!({
            "other_considerations": {"risk_analysis": "low", "tags": ["a", "b"]}
        }));
        assert!(report.is_clean());
        assert_eq!(store.get("other_considerations_risk_analysis"), Some(&json!("low")));
        assert_eq!(store.get("other_considerations_tags_list"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn generic_dates_are_normalized_with_widget() {
        let (store, _) = load(json!({
            "card_metadata": {"creation_date": "2024-01-15"}
        }));
        assert_eq!(store.get("card_metadata_creation_date"), Some(&json!("20240115")));
        assert_eq!(
            store.get("card_metadata_creation_date_widget"),
            Some(&json!("2024-01-15"))
        );
    }

    #[test]
    fn invalid_dates_become_null_and_blank_dates_stay_blank() {
        let (store, _) = load(json!({
            "card_metadata": {"creation_date": "2024-02-30"},
            "model_basic_information": {"creation_date": ""}
        }));
        assert_eq!(store.get("card_metadata_creation_date"), Some(&Value::Null));
        assert_eq!(store.get("model_basic_information_creation_date"), Some(&json!("")));
        assert_eq!(
            store.get("model_basic_information_creation_date_widget"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn seed_once_keeps_existing_edits() {
        let mut store = FlatStore::new();
        store.insert("card_metadata_creation_date", json!("20250101"));
        hydrate(
            &mut store,
            &json!({"card_metadata": {"creation_date": "20240115"}}),
        )
        .unwrap();
        assert_eq!(store.get("card_metadata_creation_date"), Some(&json!("20250101")));
        assert!(!store.contains("card_metadata_creation_date_widget"));
    }

    #[test]
    fn evaluations_register_names_and_expand_metrics() {
        let (store, report) = load(json!({
            "evaluations": [{
                "name": "Site B",
                "evaluation_date": "2024/03/01",
                "total_size": "30",
                "number_of_patients": "20240115",
                "type_gm_seg": [{"name": "DSC", "mean_data": "0.91"}]
            }]
        }));
        assert!(report.is_clean());
        assert_eq!(store.get("evaluation_forms"), Some(&json!(["Site B"])));
        assert_eq!(store.get("evaluation_Site_B_evaluation_date"), Some(&json!("20240301")));
        assert_eq!(store.get("evaluation_Site_B_total_size"), Some(&json!("30")));
        assert_eq!(
            store.get("evaluation_Site_B_number_of_patients_widget"),
            Some(&json!("2024-01-15"))
        );
        assert_eq!(store.get("evaluation_Site_B_type_gm_seg"), Some(&json!(["DSC"])));
        assert_eq!(store.get("evaluation_Site_B_type_gm_seg_list"), Some(&json!(["DSC"])));
        assert_eq!(store.get("evaluation_Site_B.DSC_mean_data"), Some(&json!("0.91")));
        assert!(!store.contains("evaluation_Site_B_name"));
    }

    #[test]
    fn canonical_length_non_dates_keep_raw_value() {
        let (store, _) = load(json!({
            "evaluations": [{"name": "A", "total_size": "31000000"}]
        }));
        assert_eq!(store.get("evaluation_A_total_size"), Some(&json!("31000000")));
        assert_eq!(store.get("evaluation_A_total_size_widget"), Some(&Value::Null));
    }

    #[test]
    fn technical_specifications_expand_repeated_groups() {
        let (store, _) = load(json!({
            "technical_specifications": {
                "model_pipeline_summary": "sCT",
                "learning_architectures": [
                    {"basic_architecture": "U-Net", "id": 0},
                    {"basic_architecture": "GAN", "id": 1}
                ],
                "hw_and_sw": {"hardware_recommended": "A100"}
            }
        }));
        assert_eq!(store.architecture_count(), 2);
        assert_eq!(
            store.get("learning_architecture_1_basic_architecture"),
            Some(&json!("GAN"))
        );
        assert!(!store.contains("learning_architecture_0_id"));
        assert_eq!(store.get("hw_and_sw_hardware_recommended"), Some(&json!("A100")));
        assert_eq!(
            store.get("technical_specifications_model_pipeline_summary"),
            Some(&json!("sCT"))
        );
    }

    #[test]
    fn malformed_section_is_reported_and_others_still_apply() {
        let (store, report) = load(json!({
            "card_metadata": {"contributor_name": "Jane"},
            "evaluations": [{"name": "ok", "url_info": "x"}, {"url_info": "no name"}],
            "other_considerations": {"risk_analysis": "low"}
        }));
        assert_eq!(report.applied, vec!["card_metadata", "other_considerations"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].section, "evaluations");
        assert!(report.failures[0].reason.contains("name"));
        assert!(!store.contains("evaluation_forms"));
        assert!(!store.contains("evaluation_ok_url_info"));
        assert_eq!(store.get("other_considerations_risk_analysis"), Some(&json!("low")));
    }

    #[test]
    fn evaluations_whose_keys_would_clash_are_rejected() {
        let (store, report) = load(json!({
            "evaluations": [
                {"name": "External", "url_info": "a"},
                {"name": "External test", "url_info": "b"}
            ]
        }));
        assert!(report.applied.is_empty());
        assert_eq!(report.failures[0].section, "evaluations");
        assert!(report.failures[0].reason.contains("External test"));
        assert!(!store.contains("evaluation_forms"));
        assert!(!store.contains("evaluation_External_url_info"));
    }

    #[test]
    fn io_entries_need_known_source() {
        let (store, report) = load(json!({
            "training_data": {
                "url_info": "x",
                "inputs_outputs_technical_specifications": [
                    {"entry": "CT", "source": "model_sideways", "fov": "1"}
                ]
            }
        }));
        assert_eq!(report.failures[0].section, "training_data");
        assert!(!store.contains("training_data_url_info"));
    }

    #[test]
    fn unknown_task_is_rejected() {
        let (store, report) = load(json!({"task": "Classification"}));
        assert_eq!(report.failures[0].section, "task");
        assert!(store.task().is_none());

        let (store, _) = load(json!({"task": "dose prediction"}));
        assert_eq!(store.get("task"), Some(&json!("Dose prediction")));
    }
}
