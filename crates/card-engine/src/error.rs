//! Engine error types.

use card_core::enums::{MetricGroup, Task};
use thiserror::Error;

/// Errors that stop a document load before any section is applied.
#[derive(Debug, Error)]
pub enum HydrateError {
    /// The document's top-level value was not a mapping.
    #[error("Document must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Why one top-level section of a document was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportFormatError {
    #[error("expected {expected}, got {found}")]
    WrongShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("entry {index} has no `{field}`")]
    MissingIdentifier { index: usize, field: &'static str },

    #[error("metric {index} in `{group}` of evaluation `{evaluation}` has no `name`")]
    MissingMetricName {
        evaluation: String,
        group: String,
        index: usize,
    },

    #[error("entry {index} has unknown source `{source_name}`")]
    UnknownSource { index: usize, source_name: String },

    #[error("evaluations `{first}` and `{second}` would share flat keys")]
    OverlappingEvaluations { first: String, second: String },

    #[error("unknown task `{0}`")]
    UnknownTask(String),
}

/// Errors from session turn operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Task already selected as {current}; cannot switch to {requested}")]
    TaskAlreadySelected { current: Task, requested: Task },

    #[error("No task selected")]
    NoTask,

    #[error("Evaluation name must not be empty")]
    EmptyEvaluationName,

    #[error("An evaluation named {0:?} already exists")]
    DuplicateEvaluation(String),

    #[error("Evaluation {name:?} clashes with the keys of evaluation {existing:?}")]
    OverlappingEvaluation { name: String, existing: String },

    #[error("Unknown evaluation: {0}")]
    UnknownEvaluation(String),

    #[error("Metric group {group} does not apply to task {task}")]
    MetricGroupNotApplicable { group: MetricGroup, task: Task },

    #[error("Metric name must not be empty")]
    EmptyMetricName,

    #[error("Metric {metric:?} already added to {group} of evaluation {evaluation:?}")]
    DuplicateMetric {
        evaluation: String,
        group: MetricGroup,
        metric: String,
    },

    #[error("Modality label must not be empty")]
    EmptyModality,

    #[error("Not a valid date: {0}")]
    InvalidDate(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Hydrate(#[from] HydrateError),
}
