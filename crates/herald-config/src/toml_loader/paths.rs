//! Where Herald keeps its files, and first-run template creation.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use herald_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "herald";
const CONFIG_FILE: &str = "config.toml";

/// `<platform config dir>/herald`. Also searched for a `.env` file.
pub fn herald_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| ConfigError::ParseError("could not determine the platform config directory".into()))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(herald_config_dir()?.join(CONFIG_FILE))
}

/// Write the commented template to `path` unless a file is already there.
///
/// Returns `true` when a new file was written.
pub fn write_template_if_missing(path: &Path) -> Result<bool, ConfigError> {
    let io_err = |what: &str, e: std::io::Error| {
        ConfigError::ParseError(format!("failed to {what} {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err("create directory for", e))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(io_err("create", e)),
    };
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| io_err("write default config to", e))?;

    info!(path = %path.display(), "wrote default config");
    Ok(true)
}
