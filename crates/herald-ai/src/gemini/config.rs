//! Gemini API client configuration.

use std::time::Duration;

use crate::AiError;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variable holding the API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini API client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-2.5-flash".to_string(),
            api_base: GEMINI_API_BASE.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Create config from the `GEMINI_API_KEY` environment variable.
    ///
    /// A missing or blank key is a setup error.
    pub fn from_env() -> Result<Self, AiError> {
        match std::env::var(GEMINI_API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(AiError::NotConfigured(format!(
                "Gemini API key is required. Set the {GEMINI_API_KEY_ENV} environment variable."
            ))),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = GeminiConfig::new("super-secret-key");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("gemini-2.5-flash"));
    }

    #[test]
    fn builder_overrides() {
        let config = GeminiConfig::new("k")
            .with_model("gemini-2.0-flash")
            .with_api_base("http://localhost:9999/models")
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.api_base, "http://localhost:9999/models");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
