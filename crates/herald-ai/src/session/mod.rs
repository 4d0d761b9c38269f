//! Conversation session management.
//!
//! A `Session` holds the conversation history (messages), replays it on
//! every turn, and runs the single tool follow-up when the model asks for
//! the weather.

mod chat;
mod manager;
mod types;

pub use manager::Session;
pub use types::{TurnOptions, TurnPhase};
