//! Required fields still unanswered under the active task.
//!
//! Four passes run in a fixed order (static sections, learning
//! architectures, modality entries, evaluations) so identical state always
//! yields an identical report.

use std::path::{Path, PathBuf};

use card_core::enums::{MetricGroup, Task};
use card_core::keys::Address;
use card_core::report::MissingFieldReport;
use card_core::store::{FlatStore, is_empty_value, is_truthy};
use card_schema::{FieldSchema, SchemaRegistry, SectionSchema, tables};

use crate::flatten::is_derived_evaluation_field;
use crate::groups::{self, RepeatedGroup};

/// Missing-field computation over one schema.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    schema: &'a SchemaRegistry,
    uploads_dir: Option<&'a Path>,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub const fn new(schema: &'a SchemaRegistry) -> Self {
        Self {
            schema,
            uploads_dir: None,
        }
    }

    /// Resolve relative upload paths against `dir`.
    #[must_use]
    pub const fn with_uploads_dir(mut self, dir: &'a Path) -> Self {
        self.uploads_dir = Some(dir);
        self
    }

    /// Every required, applicable field of `store` that is still empty.
    #[must_use]
    pub fn missing(&self, store: &FlatStore, task: Option<Task>) -> MissingFieldReport {
        let mut report = MissingFieldReport::new();
        self.static_fields(store, task, &mut report);
        let after_static = report.len();
        self.architecture_fields(store, task, &mut report);
        let after_architectures = report.len();
        self.modality_fields(store, &mut report);
        let after_modalities = report.len();
        self.evaluation_fields(store, task, &mut report);
        tracing::debug!(
            static_fields = after_static,
            architectures = after_architectures - after_static,
            modalities = after_modalities - after_architectures,
            evaluations = report.len() - after_modalities,
            "validate: missing fields computed"
        );
        report
    }

    fn static_fields(&self, store: &FlatStore, task: Option<Task>, report: &mut MissingFieldReport) {
        for (section, declared) in self.schema.sections() {
            if tables::AUXILIARY_SECTIONS.contains(&section) {
                continue;
            }
            let SectionSchema::Fields(fields) = declared else {
                continue;
            };
            for (name, field) in fields {
                if !field.required_for(task) || self.is_io_field(name) {
                    continue;
                }
                let key = Address::plain(section, name.as_str()).encode();
                if self.is_unanswered(store, field, &[key]) {
                    report.push(section, field.display_label(name));
                }
            }
        }
    }

    fn architecture_fields(
        &self,
        store: &FlatStore,
        task: Option<Task>,
        report: &mut MissingFieldReport,
    ) {
        let required: Vec<&(String, FieldSchema)> = self
            .schema
            .architecture_fields()
            .iter()
            .filter(|(_, field)| field.required_for(task))
            .collect();
        for instance in groups::architectures(store) {
            for (name, field) in &required {
                if self.is_unanswered(store, field, &instance.candidates(name)) {
                    report.push(
                        tables::LEARNING_ARCHITECTURE,
                        instance.label(&field.plain_label(name)),
                    );
                }
            }
        }
    }

    fn modality_fields(&self, store: &FlatStore, report: &mut MissingFieldReport) {
        let pairs = groups::modality_pairs(store);
        if pairs.is_empty() {
            return;
        }
        let io_fields = self.schema.io_fields();
        for pair in &pairs {
            let instance = groups::ModalityInstance::training(pair);
            for (name, field) in io_fields {
                if self.is_unanswered(store, field, &instance.candidates(name)) {
                    report.push(tables::TRAINING_DATA, instance.label(&field.plain_label(name)));
                }
            }
        }
        for evaluation in groups::evaluations(store) {
            for pair in &pairs {
                let instance = evaluation.modality(pair);
                for (name, field) in io_fields {
                    if self.is_unanswered(store, field, &instance.candidates(name)) {
                        report.push(
                            tables::EVALUATION_DATA,
                            instance.label(&field.plain_label(name)),
                        );
                    }
                }
            }
        }
    }

    fn evaluation_fields(
        &self,
        store: &FlatStore,
        task: Option<Task>,
        report: &mut MissingFieldReport,
    ) {
        let fields = self.schema.evaluation_fields();
        for evaluation in groups::evaluations(store) {
            let same_as_approved =
                is_truthy(store.get(&evaluation.key(tables::SAME_AS_APPROVED)));
            for (name, field) in fields {
                if !field.required_for(task) || is_derived_evaluation_field(self.schema, name) {
                    continue;
                }
                if same_as_approved && tables::approved_counterpart(name).is_some() {
                    continue;
                }
                if self.is_unanswered(store, field, &[evaluation.key(name)]) {
                    report.push(
                        tables::EVALUATION_DATA,
                        evaluation.label(&field.display_label(name)),
                    );
                }
            }

            for &group in MetricGroup::for_task(task) {
                let required: Vec<(&str, &FieldSchema)> = self
                    .schema
                    .metric_fields(group)
                    .iter()
                    .filter_map(|name| {
                        self.schema
                            .field(tables::EVALUATION_DATA, name)
                            .filter(|field| field.required)
                            .map(|field| (*name, field))
                    })
                    .collect();
                for metric in evaluation.metrics(store, group) {
                    for (name, field) in &required {
                        if self.is_unanswered(store, field, &[metric.key(name)]) {
                            report.push(
                                tables::EVALUATION_DATA,
                                metric.label(&field.display_label(name)),
                            );
                        }
                    }
                }
            }
        }
    }

    fn is_io_field(&self, name: &str) -> bool {
        self.schema.io_fields().iter().any(|(io, _)| io == name)
    }

    /// Image fields need an upload that still exists on disk; every other
    /// field needs a non-empty value under one of `candidates`.
    fn is_unanswered(&self, store: &FlatStore, field: &FieldSchema, candidates: &[String]) -> bool {
        if field.is_image() {
            return !candidates.iter().any(|key| self.upload_exists(store, key));
        }
        candidates
            .iter()
            .all(|key| is_empty_value(store.get(key)))
    }

    fn upload_exists(&self, store: &FlatStore, key: &str) -> bool {
        let Some(record) = store.upload(key) else {
            return false;
        };
        let path = match self.uploads_dir {
            Some(dir) if record.path.is_relative() => dir.join(&record.path),
            _ => PathBuf::from(&record.path),
        };
        let exists = path.exists();
        if !exists {
            tracing::warn!(key, path = %path.display(), "validate: upload missing on disk");
        }
        exists
    }
}

/// Missing fields of `store` under `task`, with upload paths taken as given.
#[must_use]
pub fn compute_missing(
    schema: &SchemaRegistry,
    store: &FlatStore,
    task: Option<Task>,
) -> MissingFieldReport {
    Validator::new(schema).missing(store, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::store::UploadRecord;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn schema() -> SchemaRegistry {
        SchemaRegistry::builtin().unwrap()
    }

    fn labels(report: &MissingFieldReport, section: &str) -> Vec<String> {
        report
            .iter()
            .filter(|item| item.section == section)
            .map(|item| item.label.clone())
            .collect()
    }

    fn store(value: Value) -> FlatStore {
        FlatStore::from_value(value).unwrap()
    }

    #[test]
    fn empty_store_reports_static_fields_in_schema_order() {
        let report = compute_missing(&schema(), &FlatStore::new(), None);
        let sections: Vec<&str> = report.iter().map(|item| item.section.as_str()).collect();
        let first_of = |section: &str| sections.iter().position(|s| *s == section);
        assert!(first_of("card_metadata") < first_of("technical_specifications"));
        assert!(first_of("technical_specifications") < first_of("training_data"));
        assert!(first_of("training_data") < first_of("other_considerations"));
        assert_eq!(
            labels(&report, "card_metadata"),
            vec!["Creation Date", "Contributor Name", "Contributor Email", "Version Number"]
        );
        assert!(!labels(&report, "model_basic_information")
            .contains(&"Segmentation Targets".to_string()));
    }

    #[test]
    fn task_restricted_fields_are_checked_only_for_their_task() {
        let s = FlatStore::new();
        let segmentation = compute_missing(&schema(), &s, Some(Task::Segmentation));
        let dose = compute_missing(&schema(), &s, Some(Task::DosePrediction));
        let target = "Segmentation Targets".to_string();
        assert!(labels(&segmentation, "model_basic_information").contains(&target));
        assert!(!labels(&dose, "model_basic_information").contains(&target));
    }

    #[test]
    fn image_fields_need_the_upload_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pipeline.png"), b"png").unwrap();
        let mut s = store(json!({
            "technical_specifications_model_pipeline_figure": "pipeline.png"
        }));
        let figure = "Model Pipeline Figure".to_string();

        let registry = schema();
        let validator = Validator::new(&registry).with_uploads_dir(dir.path());
        let key_only = validator.missing(&s, None);
        assert!(labels(&key_only, "technical_specifications").contains(&figure));

        s.record_upload(
            "technical_specifications_model_pipeline_figure",
            &UploadRecord {
                name: "pipeline.png".into(),
                path: "pipeline.png".into(),
            },
        );
        let uploaded = validator.missing(&s, None);
        assert!(!labels(&uploaded, "technical_specifications").contains(&figure));

        let elsewhere = Validator::new(&registry).missing(&s, None);
        assert!(labels(&elsewhere, "technical_specifications").contains(&figure));
    }

    #[test]
    fn architecture_fields_are_labeled_by_ordinal() {
        let s = store(json!({
            "learning_architecture_forms": {"Learning Architecture 1": {}, "Learning Architecture 2": {}},
            "learning_architecture_0_basic_architecture": "U-Net",
            "learning_architecture_0_loss_function": "L1",
        }));
        let report = compute_missing(&schema(), &s, None);
        assert_eq!(
            labels(&report, "learning_architecture"),
            vec![
                "Basic architecture (Learning Architecture 2)",
                "Loss function (Learning Architecture 2)",
            ]
        );
    }

    #[test]
    fn modality_fields_are_checked_per_scope_with_legacy_spellings() {
        let registry = schema();
        let io_count = registry.io_fields().len();
        let mut answers = serde_json::Map::new();
        answers.insert("training_data_model_inputs".into(), json!(["CT"]));
        answers.insert("evaluation_forms".into(), json!(["Site A"]));
        for (name, _) in registry.io_fields() {
            answers.insert(format!("__training_data_ct_model_inputs_{name}"), json!("x"));
        }
        let report = compute_missing(&registry, &FlatStore::from(answers), None);
        assert!(labels(&report, "training_data")
            .iter()
            .all(|label| !label.contains("(CT - model_inputs)")));
        let evaluation = labels(&report, "evaluation_data");
        let scoped: Vec<&String> = evaluation
            .iter()
            .filter(|label| label.ends_with("(CT - model_inputs)(Eval: Site A)"))
            .collect();
        assert_eq!(scoped.len(), io_count);
    }

    #[test]
    fn same_as_approved_suppresses_evaluator_fields() {
        let base = json!({
            "evaluation_forms": ["Site A"],
            "evaluation_Site_A_evaluated_by_name": "",
        });
        let mut suppressed = store(base.clone());
        suppressed.insert("evaluation_Site_A_evaluated_same_as_approved", json!(true));

        let name = "Evaluated By (Name) (Eval: Site A)".to_string();
        assert!(labels(&compute_missing(&schema(), &store(base), None), "evaluation_data")
            .contains(&name));
        assert!(!labels(&compute_missing(&schema(), &suppressed, None), "evaluation_data")
            .contains(&name));
    }

    #[test]
    fn metric_instances_are_checked_against_required_sub_fields() {
        let s = store(json!({
            "task": "Segmentation",
            "evaluation_forms": ["Site A"],
            "evaluation_Site_A_type_gm_seg_list": ["DSC (Dice)", "HD95"],
            "evaluation_Site_A.DSC (Dice)_metric_specifications": "3D",
            "evaluation_Site_A.DSC (Dice)_mean_data": "0.9",
            "evaluation_Site_A_type_ism_list": ["MAE"],
        }));
        let report = compute_missing(&schema(), &s, Some(Task::Segmentation));
        let metric_labels: Vec<String> = labels(&report, "evaluation_data")
            .into_iter()
            .filter(|label| label.contains("(Metric:"))
            .collect();
        assert_eq!(
            metric_labels,
            vec![
                "Metric Specifications (Metric: HD95, Eval: Site A)",
                "Mean Data (Metric: HD95, Eval: Site A)",
            ]
        );
    }

    #[test]
    fn repeated_runs_are_identical() {
        let s = store(json!({
            "evaluation_forms": ["B", "A"],
            "training_data_model_outputs": ["RTSTRUCT"],
            "learning_architecture_forms": {"Learning Architecture 1": {}},
        }));
        let registry = schema();
        assert_eq!(
            compute_missing(&registry, &s, Some(Task::Other)),
            compute_missing(&registry, &s, Some(Task::Other))
        );
    }
}
