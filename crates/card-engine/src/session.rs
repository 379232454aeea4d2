//! One author's questionnaire session.
//!
//! A [`Session`] owns its flat store and shares a read-only schema. Each
//! method is one turn: it runs to completion and leaves the store
//! consistent for the next one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use card_core::dates::{DateInput, parse_canonical_date, to_canonical_date, widget_date};
use card_core::enums::{IoSource, MetricGroup, Task};
use card_core::keys::{self, Address, ModalityScope};
use card_core::ordered::Document;
use card_core::report::MissingFieldReport;
use card_core::store::{FlatStore, UploadRecord};
use card_schema::{SchemaRegistry, tables};
use serde_json::{Map, Value};

use crate::error::{HydrateError, SessionError};
use crate::formats::{FormatViolation, check_formats};
use crate::groups::{self, ArchitectureInstance, EvaluationInstance, RepeatedGroup};
use crate::hydrate::{HydrateReport, hydrate};
use crate::validate::Validator;

#[derive(Debug, Clone)]
pub struct Session {
    store: FlatStore,
    schema: Arc<SchemaRegistry>,
    uploads_dir: Option<PathBuf>,
}

impl Session {
    #[must_use]
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self {
            store: FlatStore::new(),
            schema,
            uploads_dir: None,
        }
    }

    /// Resume from a previously saved store.
    #[must_use]
    pub fn with_store(mut self, store: FlatStore) -> Self {
        self.store = store;
        self
    }

    /// Directory relative upload paths are resolved against.
    #[must_use]
    pub fn with_uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn store(&self) -> &FlatStore {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> FlatStore {
        self.store
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    #[must_use]
    pub fn task(&self) -> Option<Task> {
        self.store.task()
    }

    // ---- turns ----

    /// Choose the session's task. The task cannot change once chosen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TaskAlreadySelected` if a different task is set.
    pub fn select_task(&mut self, task: Task) -> Result<(), SessionError> {
        match self.task() {
            Some(current) if current != task => Err(SessionError::TaskAlreadySelected {
                current,
                requested: task,
            }),
            Some(_) => Ok(()),
            None => {
                self.store.insert(keys::TASK, Value::from(task.as_str()));
                tracing::debug!(task = %task, "session: task selected");
                Ok(())
            }
        }
    }

    /// Store an answer. Lists are mirrored at their `_list` shadow.
    pub fn set(&mut self, address: &Address, value: Value) {
        self.store.insert_with_shadow(&address.encode(), value);
    }

    /// Store a date answer in canonical form with its ISO widget value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidDate` if `value` is not a real date.
    pub fn set_date<'d>(
        &mut self,
        address: &Address,
        value: impl Into<DateInput<'d>>,
    ) -> Result<(), SessionError> {
        let input = value.into();
        let invalid = || {
            SessionError::InvalidDate(match input {
                DateInput::Text(text) => text.to_string(),
                DateInput::Date(date) => date.to_string(),
            })
        };
        let canonical = to_canonical_date(input).ok_or_else(invalid)?;
        let date = parse_canonical_date(&canonical).ok_or_else(invalid)?;
        let key = address.encode();
        self.store.insert(keys::widget_key(&key), Value::String(widget_date(date)));
        self.store.insert(key, Value::String(canonical));
        Ok(())
    }

    /// Register one more learning architecture and return its 0-based index.
    pub fn add_learning_architecture(&mut self) -> usize {
        let index = self.store.architecture_count();
        let mut forms = self
            .store
            .get(keys::ARCHITECTURE_FORMS)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        forms.insert(
            ArchitectureInstance { index }.form_name(),
            Value::Object(Map::new()),
        );
        self.store.insert(keys::ARCHITECTURE_FORMS, Value::Object(forms));
        index
    }

    /// Drop the last learning architecture and every key it owns.
    ///
    /// Returns the removed index, or `None` if there was none.
    pub fn remove_learning_architecture(&mut self) -> Option<usize> {
        let index = self.store.architecture_count().checked_sub(1)?;
        let mut forms = self
            .store
            .get(keys::ARCHITECTURE_FORMS)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        forms.shift_remove(&ArchitectureInstance { index }.form_name());
        self.store.insert(keys::ARCHITECTURE_FORMS, Value::Object(forms));

        let codec = self.codec();
        let before = self.store.len();
        self.store.retain(|key, _| {
            !matches!(
                codec.decode(key),
                Some(Address::Architecture { index: owner, .. }) if owner == index
            )
        });
        tracing::debug!(index, removed = before - self.store.len(), "session: architecture removed");
        Some(index)
    }

    /// Register an evaluation and return its slug.
    ///
    /// # Errors
    ///
    /// Returns `EmptyEvaluationName` for a blank name,
    /// `DuplicateEvaluation` when another evaluation has the same slug, and
    /// `OverlappingEvaluation` when one slug extends the other, since their
    /// keys could then decode to either evaluation.
    pub fn add_evaluation(&mut self, name: &str) -> Result<String, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyEvaluationName);
        }
        let added = EvaluationInstance::new(name);
        let mut names = self.store.evaluation_names();
        for existing in &names {
            let slug = keys::slugify(existing);
            if slug == added.slug {
                return Err(SessionError::DuplicateEvaluation(name.to_string()));
            }
            if keys::slugs_overlap(&slug, &added.slug) {
                return Err(SessionError::OverlappingEvaluation {
                    name: name.to_string(),
                    existing: existing.clone(),
                });
            }
        }
        names.push(added.name);
        self.store.insert(keys::EVALUATION_FORMS, names_value(&names));
        Ok(added.slug)
    }

    /// Unregister an evaluation and drop every key in its namespace.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvaluation` if no evaluation has that name.
    pub fn remove_evaluation(&mut self, name: &str) -> Result<(), SessionError> {
        let evaluation = self.evaluation(name)?;
        let codec = self.codec();
        let slug = evaluation.slug.as_str();
        self.store.retain(|key, _| match codec.decode(key) {
            Some(
                Address::Evaluation { slug: owner, .. }
                | Address::Metric { slug: owner, .. }
                | Address::Modality {
                    scope: ModalityScope::Evaluation { slug: owner },
                    ..
                },
            ) => owner != slug,
            _ => true,
        });
        let names: Vec<String> = self
            .store
            .evaluation_names()
            .into_iter()
            .filter(|existing| *existing != evaluation.name)
            .collect();
        self.store.insert(keys::EVALUATION_FORMS, names_value(&names));
        tracing::debug!(evaluation = %evaluation.name, "session: evaluation removed");
        Ok(())
    }

    /// Add a metric to one metric group of an evaluation.
    ///
    /// # Errors
    ///
    /// Fails if the evaluation is unknown, no task is selected, the group
    /// does not apply to the task, or the name is blank or already added.
    pub fn add_metric(
        &mut self,
        evaluation: &str,
        group: MetricGroup,
        metric: &str,
    ) -> Result<(), SessionError> {
        let evaluation = self.evaluation(evaluation)?;
        let task = self.task().ok_or(SessionError::NoTask)?;
        if !task.metric_groups().contains(&group) {
            return Err(SessionError::MetricGroupNotApplicable { group, task });
        }
        let metric = metric.trim();
        if metric.is_empty() {
            return Err(SessionError::EmptyMetricName);
        }
        let mut names: Vec<String> = evaluation
            .metrics(&self.store, group)
            .into_iter()
            .map(|instance| instance.name)
            .collect();
        if names.iter().any(|existing| existing == metric) {
            return Err(SessionError::DuplicateMetric {
                evaluation: evaluation.name,
                group,
                metric: metric.to_string(),
            });
        }
        names.push(metric.to_string());
        self.store
            .insert_with_shadow(&evaluation.key(group.as_str()), names_value(&names));
        Ok(())
    }

    /// Remove every metric of `group` from an evaluation, with their answers.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvaluation` if no evaluation has that name.
    pub fn clear_metrics(&mut self, evaluation: &str, group: MetricGroup) -> Result<(), SessionError> {
        let evaluation = self.evaluation(evaluation)?;
        let metric_keys: Vec<String> = evaluation
            .metrics(&self.store, group)
            .iter()
            .flat_map(|metric| {
                tables::metric_fields(group)
                    .iter()
                    .map(move |field| metric.key(field))
            })
            .collect();
        for key in metric_keys {
            self.store.remove(&key);
        }
        self.store.remove(&evaluation.metric_list_key(group));
        self.store.remove(&evaluation.key(group.as_str()));
        Ok(())
    }

    /// Append a modality label to the training inputs or outputs.
    ///
    /// # Errors
    ///
    /// Returns `EmptyModality` for a blank label.
    pub fn add_modality(&mut self, source: IoSource, label: &str) -> Result<(), SessionError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SessionError::EmptyModality);
        }
        let key = Address::plain(tables::TRAINING_DATA, source.as_str()).encode();
        let mut labels = self.store.string_list(&key);
        labels.push(label.to_string());
        self.store.insert_with_shadow(&key, names_value(&labels));
        Ok(())
    }

    /// Record an uploaded file for the image field at `address`.
    pub fn record_upload(&mut self, address: &Address, name: &str, path: impl Into<PathBuf>) {
        let key = address.encode();
        let record = UploadRecord {
            name: name.to_string(),
            path: path.into(),
        };
        self.store.record_upload(&key, &record);
        self.store.insert(key, Value::from(name));
    }

    // ---- engines ----

    /// The structured document for the current answers.
    #[must_use]
    pub fn export(&self) -> Document {
        crate::flatten(&self.store, &self.schema, self.task())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if the document cannot be
    /// rendered.
    pub fn export_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Load a structured document into the session.
    ///
    /// # Errors
    ///
    /// Returns `HydrateError::NotAnObject` for a non-mapping document.
    pub fn load(&mut self, document: &Value) -> Result<HydrateReport, HydrateError> {
        hydrate(&mut self.store, document)
    }

    #[must_use]
    pub fn missing(&self) -> MissingFieldReport {
        let validator = Validator::new(&self.schema);
        let validator = match self.uploads_dir.as_deref() {
            Some(dir) => validator.with_uploads_dir(dir),
            None => validator,
        };
        validator.missing(&self.store, self.task())
    }

    #[must_use]
    pub fn format_violations(&self) -> Vec<FormatViolation> {
        check_formats(&self.schema, &self.store, self.task())
    }

    #[must_use]
    pub fn uploads_dir(&self) -> Option<&Path> {
        self.uploads_dir.as_deref()
    }

    fn evaluation(&self, name: &str) -> Result<EvaluationInstance, SessionError> {
        groups::evaluations(&self.store)
            .into_iter()
            .find(|evaluation| evaluation.name == name)
            .ok_or_else(|| SessionError::UnknownEvaluation(name.to_string()))
    }

    fn codec(&self) -> keys::KeyCodec {
        self.schema.codec(
            self.store
                .evaluation_names()
                .iter()
                .map(|name| keys::slugify(name)),
        )
    }
}

fn names_value(names: &[String]) -> Value {
    Value::Array(names.iter().map(|name| Value::from(name.as_str())).collect())
}
