//! Schema file location.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaConfig {
    /// Schema file replacing the embedded default.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SchemaConfig {
    #[must_use]
    pub const fn is_overridden(&self) -> bool {
        self.path.is_some()
    }
}
