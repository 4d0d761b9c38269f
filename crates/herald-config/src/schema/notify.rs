//! Notification dispatcher and job scheduler configuration.

use serde::{Deserialize, Serialize};

/// Messaging and job-store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// sqlx SQLite URL of the durable job store.
    pub database_url: String,
    /// Network timeout for a single provider send, in seconds (valid range: 1-120).
    pub send_timeout_secs: u32,
    /// Liveness heartbeat interval in seconds (valid range: 5-3600).
    pub heartbeat_secs: u32,
    /// Base URL of the messaging provider's REST API.
    pub twilio_api_base: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://jobs.sqlite".to_string(),
            send_timeout_secs: 15,
            heartbeat_secs: 30,
            twilio_api_base: "https://api.twilio.com".to_string(),
        }
    }
}

/// Background scheduler policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Concurrent job executions across all jobs (valid range: 1-64).
    pub max_workers: u32,
    /// Concurrent executions of one job (valid range: 1-16).
    pub max_instances: u32,
    /// Collapse a backlog of missed runs into a single run.
    pub coalesce: bool,
    /// How late a run may start before it is dropped, in seconds.
    pub misfire_grace_secs: u64,
    /// Upper bound on how long the scheduler sleeps between store scans.
    pub poll_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            max_instances: 3,
            coalesce: false,
            misfire_grace_secs: 86_400,
            poll_interval_ms: 1_000,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_partial_toml() {
        let toml_str = r#"
coalesce = true
misfire_grace_secs = 60
"#;
        let config: SchedulerConfig = toml::from_str(toml_str).unwrap();
        assert!(config.coalesce);
        assert_eq!(config.misfire_grace_secs, 60);
        assert_eq!(config.max_workers, 10);
    }

    #[test]
    fn notify_config_partial_toml() {
        let config: NotifyConfig =
            toml::from_str(r#"database_url = "sqlite:///var/lib/herald/jobs.db""#).unwrap();
        assert_eq!(config.database_url, "sqlite:///var/lib/herald/jobs.db");
        assert_eq!(config.heartbeat_secs, 30);
    }
}
