//! General application configuration.

use std::path::PathBuf;

use card_core::enums::Task;
use serde::{Deserialize, Serialize};

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Task used when a session has none and no `--task` flag is given.
    #[serde(default)]
    pub default_task: Option<Task>,

    /// Directory relative upload paths are resolved against.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// Whether `validate` fails when required fields are missing.
    #[serde(default)]
    pub strict: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_task: None,
            uploads_dir: default_uploads_dir(),
            strict: false,
        }
    }
}
