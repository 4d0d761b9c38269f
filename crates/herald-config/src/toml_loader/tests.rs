//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_herald_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, herald_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[assistant]
model = "gemini-2.0-flash"
temperature = 0.3

[notify]
database_url = "sqlite://custom.sqlite"
"##,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.assistant.model, "gemini-2.0-flash");
    assert!((config.assistant.temperature - 0.3).abs() < f64::EPSILON);
    assert_eq!(config.notify.database_url, "sqlite://custom.sqlite");
    // Defaults preserved
    assert_eq!(config.assistant.max_output_tokens, 200);
    assert_eq!(config.scheduler.max_workers, 10);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, herald_common::ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_keeps_parsed_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[scheduler]
max_workers = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.scheduler.max_workers, 0);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("herald").join("config.toml");

    assert!(write_template_if_missing(&path).unwrap());
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.assistant.model, "gemini-2.5-flash");
    assert_eq!(config.notify.heartbeat_secs, 30);
}

#[test]
fn default_config_toml_is_valid() {
    use super::template::default_config_toml;
    use crate::schema::HeraldConfig;

    let config: HeraldConfig = toml::from_str(&default_config_toml()).unwrap();
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn default_config_path_is_reasonable() {
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("herald"));
        assert!(path_str.ends_with("config.toml"));
    }
}

#[test]
fn template_never_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[assistant]\nmodel = \"mine\"\n").unwrap();

    assert!(!write_template_if_missing(&path).unwrap());
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.assistant.model, "mine");
}
