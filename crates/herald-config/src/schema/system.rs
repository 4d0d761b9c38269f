//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `tracing_subscriber::EnvFilter` directive scoped to Herald's crates.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "herald=trace",
            LogLevel::Debug => "herald=debug",
            LogLevel::Info => "herald=info",
            LogLevel::Warn => "herald=warn",
            LogLevel::Error => "herald=error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
