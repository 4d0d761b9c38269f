//! Tool definitions and the local dispatch table.
//!
//! Tools are functions the model can ask us to run. The model only ever
//! sees the declarations; execution happens in [`ToolDispatcher`].

mod definitions;
mod dispatch;

pub use definitions::{builtin_tools, to_gemini_tool, WEATHER_TOOL};
pub use dispatch::{ToolDispatcher, ToolInvocation};
