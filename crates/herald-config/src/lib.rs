//! Herald configuration system.
//!
//! Provides TOML-based configuration with full validation. All config
//! sections use sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use herald_config::load_config_from;
//!
//! let config = load_config_from(None).expect("failed to load config");
//! println!("model: {}", config.assistant.model);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{HeraldConfig, CONFIG_SCHEMA_VERSION};

use herald_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path, or from `override_path`
/// when one is given.
///
/// The default path is created from the commented template if missing.
/// An explicit override must exist.
pub fn load_config_from(override_path: Option<&Path>) -> Result<HeraldConfig, ConfigError> {
    match override_path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn explicit_missing_override_is_an_error() {
        let err = load_config_from(Some(Path::new("/tmp/herald_missing_override.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn explicit_override_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(&path, "[weather]\ntimeout_secs = 9\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.weather.timeout_secs, 9);
    }
}
