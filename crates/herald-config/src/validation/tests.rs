//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    let config = HeraldConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_empty_model() {
    let mut config = HeraldConfig::default();
    config.assistant.model = "  ".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("assistant.model"));
}

#[test]
fn catches_temperature_out_of_range() {
    let mut config = HeraldConfig::default();
    config.assistant.temperature = 3.5;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("assistant.temperature"));
}

#[test]
fn catches_nan_temperature() {
    let mut config = HeraldConfig::default();
    config.assistant.temperature = f64::NAN;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("assistant.temperature"));
}

#[test]
fn catches_zero_max_output_tokens() {
    let mut config = HeraldConfig::default();
    config.assistant.max_output_tokens = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("assistant.max_output_tokens"));
}

#[test]
fn catches_non_http_weather_url() {
    let mut config = HeraldConfig::default();
    config.weather.base_url = "ftp://wttr.in".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("weather.base_url"));
}

#[test]
fn catches_non_sqlite_database_url() {
    let mut config = HeraldConfig::default();
    config.notify.database_url = "postgres://localhost/jobs".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("notify.database_url"));
}

#[test]
fn catches_heartbeat_too_fast() {
    let mut config = HeraldConfig::default();
    config.notify.heartbeat_secs = 1;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("notify.heartbeat_secs"));
}

#[test]
fn catches_zero_workers() {
    let mut config = HeraldConfig::default();
    config.scheduler.max_workers = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("scheduler.max_workers"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = HeraldConfig::default();
    config.scheduler.max_instances = 0;
    config.weather.timeout_secs = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("scheduler.max_instances"));
    assert!(err.contains("weather.timeout_secs"));
    assert!(err.contains("; "));
}
