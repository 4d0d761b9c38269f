//! Session struct and conversation management.

use tracing::debug;

use herald_common::SessionId;

use crate::token_tracker::TokenTracker;
use crate::tools::{builtin_tools, ToolDispatcher};
use crate::{Message, Role, ToolDefinition};

use super::types::TurnPhase;

/// A conversation session with message history and tool execution.
pub struct Session {
    pub(super) id: SessionId,
    /// Conversation message history. Replayed in full on every turn.
    pub(super) messages: Vec<Message>,
    /// Tool definitions declared on the first model call of a turn.
    pub(super) tools: Vec<ToolDefinition>,
    pub(super) dispatcher: ToolDispatcher,
    pub(super) tracker: TokenTracker,
    /// Provider name for token tracking.
    pub(super) provider: String,
    pub(super) phase: TurnPhase,
    /// Phases visited by the most recent turn.
    pub(super) last_path: Vec<TurnPhase>,
    /// History length before the turn in flight. Still set on entry to the
    /// next turn only if the previous one was dropped mid-way.
    pub(super) open_turn: Option<usize>,
}

impl Session {
    pub fn new(provider: impl Into<String>, dispatcher: ToolDispatcher) -> Self {
        let id = SessionId::new();
        debug!(session = %id, "Session created");
        Self {
            id,
            messages: Vec::new(),
            tools: builtin_tools(),
            dispatcher,
            tracker: TokenTracker::new(),
            provider: provider.into(),
            phase: TurnPhase::AwaitingInput,
            last_path: Vec::new(),
            open_turn: None,
        }
    }

    pub(super) fn advance(&mut self, next: TurnPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal turn transition {} -> {}",
            self.phase,
            next
        );
        debug!(from = %self.phase, to = %next, "Turn phase");
        self.phase = next;
        self.last_path.push(next);
    }

    pub(crate) fn build_messages(&self, system_prompt: Option<&str>) -> Vec<Message> {
        let mut msgs = Vec::with_capacity(self.messages.len() + 1);
        if let Some(system) = system_prompt.filter(|s| !s.trim().is_empty()) {
            msgs.push(Message::new(Role::System, system));
        }
        msgs.extend(self.messages.iter().cloned());
        msgs
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Get the full conversation history.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Phases the most recent turn passed through, in order.
    pub fn last_turn_path(&self) -> &[TurnPhase] {
        &self.last_path
    }

    /// Get the token tracker.
    pub fn tracker(&self) -> &TokenTracker {
        &self.tracker
    }

    /// Clear conversation history. Token counters are kept.
    pub fn clear_history(&mut self) {
        debug!(session = %self.id, dropped = self.messages.len(), "History cleared");
        self.messages.clear();
    }

    /// Number of messages in history.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Numbered transcript of the conversation for display.
    pub fn render_history(&self) -> String {
        if self.messages.is_empty() {
            return "📝 No conversation history yet.".to_string();
        }

        let rule = "-".repeat(40);
        let mut out = format!("📝 Conversation History:\n{rule}\n");
        for (i, msg) in self.messages.iter().enumerate() {
            let n = i + 1;
            let line = match msg.role {
                Role::User => format!("{n}. 👤 User: {}", msg.content),
                Role::Assistant => format!("{n}. 🤖 Assistant: {}", msg.content),
                Role::Tool => format!("{n}. 🔧 Tool: [Tool Result: {}]", msg.content),
                Role::System => format!("{n}. ⚙️ System: {}", msg.content),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&rule);
        out
    }
}
