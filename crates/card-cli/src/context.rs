use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use card_config::CardConfig;
use card_core::store::FlatStore;
use card_engine::Session;
use card_schema::SchemaRegistry;

use crate::cli::GlobalFlags;

/// Shared state for one command invocation.
pub struct AppContext {
    pub config: CardConfig,
    pub schema: Arc<SchemaRegistry>,
}

impl AppContext {
    /// Load the schema named by `--schema`, then the config, then the
    /// embedded default.
    pub fn init(config: CardConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let schema = match flags.schema.as_deref().or(config.schema.path.as_deref()) {
            Some(path) => SchemaRegistry::from_path(path)
                .with_context(|| format!("failed to load schema {}", path.display()))?,
            None => SchemaRegistry::builtin().context("failed to load embedded schema")?,
        };
        Ok(Self {
            config,
            schema: Arc::new(schema),
        })
    }

    /// Open a session file. A missing file starts an empty session.
    pub fn open_session(&self, path: &Path, flags: &GlobalFlags) -> anyhow::Result<Session> {
        let store = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read session {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("session {} is not valid JSON", path.display()))?;
            FlatStore::from_value(value)
                .with_context(|| format!("session {} is not a flat store", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "context: starting empty session");
            FlatStore::new()
        };

        let mut session = Session::new(Arc::clone(&self.schema))
            .with_store(store)
            .with_uploads_dir(self.uploads_dir(path));
        let task = match (flags.task, session.task()) {
            (Some(task), _) => Some(task),
            (None, None) => self.config.general.default_task,
            (None, Some(_)) => None,
        };
        if let Some(task) = task {
            session.select_task(task)?;
        }
        Ok(session)
    }

    /// Write a session back to disk as pretty JSON.
    pub fn save_session(path: &Path, session: &Session) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(session.store())?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write session {}", path.display()))
    }

    /// Relative upload directories are taken from the session file's folder.
    fn uploads_dir(&self, session_path: &Path) -> PathBuf {
        let dir = &self.config.general.uploads_dir;
        if dir.is_absolute() {
            return dir.clone();
        }
        session_path
            .parent()
            .map_or_else(|| dir.clone(), |parent| parent.join(dir))
    }
}
