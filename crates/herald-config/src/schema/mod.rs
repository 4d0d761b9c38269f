//! Configuration schema types for Herald.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the assistant and the
//! dispatcher ship with.

mod assistant;
mod notify;
mod system;

pub use assistant::*;
pub use notify::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Herald.
///
/// Credentials are never read from this file; they come from the
/// environment (`GEMINI_API_KEY`, `TWILIO_*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct HeraldConfig {
    pub assistant: AssistantConfig,
    pub weather: WeatherConfig,
    pub notify: NotifyConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_assistant_defaults() {
        let config = HeraldConfig::default();
        assert_eq!(config.assistant.model, "gemini-2.5-flash");
        assert_eq!(config.assistant.max_output_tokens, 200);
        assert!((config.assistant.temperature - 0.7).abs() < f64::EPSILON);
        assert!(config.assistant.system_prompt.contains("get_weather"));
    }

    #[test]
    fn default_config_has_weather_defaults() {
        let config = HeraldConfig::default();
        assert_eq!(config.weather.base_url, "https://wttr.in");
        assert_eq!(config.weather.timeout_secs, 6);
    }

    #[test]
    fn default_config_has_scheduler_defaults() {
        let config = HeraldConfig::default();
        assert_eq!(config.scheduler.max_workers, 10);
        assert_eq!(config.scheduler.max_instances, 3);
        assert!(!config.scheduler.coalesce);
        assert_eq!(config.scheduler.misfire_grace_secs, 86_400);
    }

    #[test]
    fn default_config_has_notify_defaults() {
        let config = HeraldConfig::default();
        assert_eq!(config.notify.database_url, "sqlite://jobs.sqlite");
        assert_eq!(config.notify.heartbeat_secs, 30);
        assert_eq!(config.notify.send_timeout_secs, 15);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config: HeraldConfig = toml::from_str("").unwrap();
        assert_eq!(config.assistant.model, "gemini-2.5-flash");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let toml_str = r#"
[assistant]
model = "gemini-2.0-flash"

[scheduler]
max_workers = 4
"#;
        let config: HeraldConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.assistant.model, "gemini-2.0-flash");
        assert_eq!(config.assistant.max_output_tokens, 200);
        assert_eq!(config.scheduler.max_workers, 4);
        assert_eq!(config.scheduler.max_instances, 3);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = HeraldConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: HeraldConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.notify.database_url, config.notify.database_url);
        assert_eq!(parsed.weather.base_url, config.weather.base_url);
    }
}
