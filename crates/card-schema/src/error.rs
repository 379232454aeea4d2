//! Schema loading error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or querying the schema registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Requested section was not found in the registry.
    #[error("Schema section not found: {0}")]
    NotFound(String),

    /// The schema file did not pass validation against its JSON Schema.
    #[error("Validation failed: {errors:?}")]
    ValidationFailed {
        /// Individual error messages from the validator.
        errors: Vec<String>,
    },

    /// Schema generation or compilation error.
    #[error("Schema generation error: {0}")]
    Generation(String),

    /// The schema file was not valid JSON.
    #[error("Schema parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field declared a `format` pattern that is not a valid regex.
    #[error("Invalid format for {section}.{field}: {reason}")]
    InvalidFormat {
        section: String,
        field: String,
        reason: String,
    },

    /// The schema file could not be read.
    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
