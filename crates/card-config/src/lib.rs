//! # card-config
//!
//! Layered configuration loading for the model card tools using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`MODELCARD_*` prefix, `__` as separator)
//! 2. Project-level `.modelcard/config.toml`
//! 3. User-level `~/.config/modelcard/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `MODELCARD_GENERAL__DEFAULT_TASK` -> `general.default_task`
//! and `MODELCARD_SCHEMA__PATH` -> `schema.path`.
//!
//! # Usage
//!
//! ```no_run
//! use card_config::CardConfig;
//!
//! let config = CardConfig::load_with_dotenv().expect("config");
//! if let Some(task) = config.general.default_task {
//!     println!("default task: {task}");
//! }
//! ```

mod error;
mod general;
mod schema;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use schema::SchemaConfig;

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MODELCARD_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CardConfig {
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl CardConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does not read `.env`; use [`Self::load_with_dotenv`] for that.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed, or
    /// `ConfigError::InvalidValue` if the result fails [`Self::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".modelcard/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject values that extract cleanly but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty `general.uploads_dir`
    /// or a `schema.path` that does not exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.uploads_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.uploads_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(path) = &self.schema.path
            && !path.exists()
        {
            return Err(ConfigError::InvalidValue {
                field: "schema.path".into(),
                reason: format!("{} does not exist", path.display()),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("modelcard").join("config.toml"))
    }

    /// Load `.env` from the current directory. Missing files are ignored.
    fn load_dotenv() {
        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CardConfig::default();
        assert!(!config.schema.is_overridden());
        assert!(!config.general.strict);
        config.validate().unwrap();
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: CardConfig = CardConfig::figment().extract()?;
            assert!(config.general.default_task.is_none());
            assert_eq!(config.general.uploads_dir, PathBuf::from("uploads"));
            Ok(())
        });
    }
}
