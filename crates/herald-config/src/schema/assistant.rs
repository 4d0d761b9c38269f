//! Conversational assistant and weather tool configuration.

use serde::{Deserialize, Serialize};

/// Default system prompt for interactive chat.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant with access to tools. \
You can get weather information for cities using the get_weather tool. \
Keep responses concise and engaging. You can reference previous parts of our conversation. \
When asked about weather, use the get_weather tool to provide accurate information.";

/// Language-model settings used for every chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Gemini model name (e.g. `gemini-2.5-flash`).
    pub model: String,
    /// Upper bound on generated tokens per model call (valid range: 1-8192).
    pub max_output_tokens: u32,
    /// Sampling temperature (valid range: 0.0-2.0).
    pub temperature: f64,
    /// System prompt sent with every request. Empty disables it.
    pub system_prompt: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_output_tokens: 200,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Weather lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    /// Request timeout in seconds (valid range: 1-60).
    pub timeout_secs: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wttr.in".to_string(),
            timeout_secs: 6,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
