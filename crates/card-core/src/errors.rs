//! Cross-cutting error types for the model card crates.
//!
//! Domain-specific errors (`SchemaError`, `HydrateError`, `ConfigError`) are
//! defined in their respective crates. The binary converges them through
//! `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any model card crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A task name did not match any known task.
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// A metric group identifier did not match any known group.
    #[error("Unknown metric group: {0}")]
    UnknownMetricGroup(String),

    /// An IO source was neither `model_inputs` nor `model_outputs`.
    #[error("Unknown input/output source: {0}")]
    UnknownSource(String),

    /// A flat store snapshot was not a JSON object.
    #[error("Flat store must be a JSON object, got {0}")]
    StoreShape(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
