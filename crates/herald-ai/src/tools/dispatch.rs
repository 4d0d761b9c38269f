//! Resolves model function calls against the local tool table.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::weather::WeatherLookup;
use crate::ToolCall;

use super::definitions::WEATHER_TOOL;

/// A function call with its arguments normalised to a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    /// Normalise a raw call. Arguments may arrive as an object, a
    /// JSON-encoded object string, a bare string (taken as the city), or null.
    pub fn from_call(call: &ToolCall) -> Self {
        Self {
            name: call.name.clone(),
            arguments: normalize_arguments(&call.arguments),
        }
    }

    fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn normalize_arguments(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            _ => {
                let mut map = Map::new();
                map.insert("city".to_string(), Value::String(s.clone()));
                map
            }
        },
        _ => Map::new(),
    }
}

/// Static dispatch table from tool name to local implementation.
///
/// Every call yields text for the model; failures are rendered rather
/// than propagated so a bad tool call never aborts the turn.
#[derive(Clone)]
pub struct ToolDispatcher {
    weather: Arc<dyn WeatherLookup>,
}

impl ToolDispatcher {
    pub fn new(weather: Arc<dyn WeatherLookup>) -> Self {
        Self { weather }
    }

    pub async fn dispatch(&self, call: &ToolCall) -> String {
        let invocation = ToolInvocation::from_call(call);
        debug!(tool = %invocation.name, "Executing tool");

        match invocation.name.as_str() {
            WEATHER_TOOL => self.get_weather(&invocation).await,
            other => {
                warn!(tool = %other, "model requested an unknown tool");
                format!("Tool '{other}' not implemented.")
            }
        }
    }

    async fn get_weather(&self, invocation: &ToolInvocation) -> String {
        let Some(city) = invocation.str_arg("city") else {
            return format!("Error: tool '{WEATHER_TOOL}' requires a non-empty 'city' argument.");
        };
        match self.weather.current(city).await {
            Ok(report) => report.to_string(),
            Err(e) => {
                warn!(%city, error = %e, "weather lookup failed");
                format!("Error fetching weather for {city}: {e}")
            }
        }
    }
}
