use std::path::PathBuf;

use card_config::CardConfig;
use card_core::enums::Task;
use figment::Jail;
use pretty_assertions::assert_eq;

#[test]
fn env_vars_fill_nested_sections() {
    Jail::expect_with(|jail| {
        jail.set_env("MODELCARD_GENERAL__DEFAULT_TASK", "Other");
        jail.set_env("MODELCARD_GENERAL__STRICT", "true");

        let config = CardConfig::load().expect("config loads");
        assert_eq!(config.general.default_task, Some(Task::Other));
        assert!(config.general.strict);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".modelcard")?;
        jail.create_file(
            ".modelcard/config.toml",
            "[general]\nuploads_dir = \"from_file\"\n",
        )?;
        jail.set_env("MODELCARD_GENERAL__UPLOADS_DIR", "from_env");

        let config = CardConfig::load().expect("config loads");
        assert_eq!(config.general.uploads_dir, PathBuf::from("from_env"));
        Ok(())
    });
}

#[test]
fn empty_uploads_dir_is_invalid() {
    let mut config = CardConfig::default();
    config.general.uploads_dir = PathBuf::new();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("general.uploads_dir"));
}
