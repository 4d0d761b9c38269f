//! Full configuration validation.
//!
//! Validates numeric ranges and endpoint formats. Each domain has its own
//! submodule; this orchestrator calls them all and collects errors into a
//! single `ConfigError`.

mod assistant;
mod helpers;
mod notify;

#[cfg(test)]
mod tests;

use crate::schema::HeraldConfig;
use herald_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HeraldConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    assistant::validate_assistant(&mut errors, config);
    assistant::validate_weather(&mut errors, config);
    notify::validate_notify(&mut errors, config);
    notify::validate_scheduler(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
