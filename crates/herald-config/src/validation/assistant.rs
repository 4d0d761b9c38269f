//! Validation for the assistant and weather sections.

use crate::schema::HeraldConfig;

use super::helpers::{validate_http_url, validate_range, validate_range_f64};

/// Validate model generation settings.
pub(crate) fn validate_assistant(errors: &mut Vec<String>, config: &HeraldConfig) {
    if config.assistant.model.trim().is_empty() {
        errors.push("assistant.model must not be empty".to_string());
    }
    validate_range(
        errors,
        "assistant.max_output_tokens",
        config.assistant.max_output_tokens,
        1,
        8192,
    );
    validate_range_f64(
        errors,
        "assistant.temperature",
        config.assistant.temperature,
        0.0,
        2.0,
    );
}

/// Validate the weather endpoint.
pub(crate) fn validate_weather(errors: &mut Vec<String>, config: &HeraldConfig) {
    validate_http_url(errors, "weather.base_url", &config.weather.base_url);
    validate_range(
        errors,
        "weather.timeout_secs",
        config.weather.timeout_secs,
        1,
        60,
    );
}
