//! Built-in tool declarations exposed to the model.

use crate::ToolDefinition;

/// Name of the weather tool as declared to the model.
pub const WEATHER_TOOL: &str = "get_weather";

/// Create the tool definitions Herald exposes to AI models.
pub fn builtin_tools() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: WEATHER_TOOL.to_string(),
        description: "Get current weather information for a city".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city name to get weather for"
                }
            },
            "required": ["city"]
        }),
    }]
}

/// Convert a tool definition to the Gemini API format.
pub fn to_gemini_tool(tool: &ToolDefinition) -> serde_json::Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}
