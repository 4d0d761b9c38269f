//! Per-turn options and the turn phase machine.

use std::fmt;

use crate::GenerationParams;

/// Options applied to a single call of [`Session::send_turn`](super::Session::send_turn).
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Prepended as a system instruction when present.
    pub system_prompt: Option<String>,
    pub generation: GenerationParams,
}

impl TurnOptions {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }
}

/// Where a turn currently is.
///
/// `AwaitingInput -> ModelCalled -> Done` for a plain answer, or
/// `AwaitingInput -> ModelCalled -> ToolDetected -> ToolExecuted ->
/// FollowupCalled -> Done` when the model requests a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    AwaitingInput,
    ModelCalled,
    ToolDetected,
    ToolExecuted,
    FollowupCalled,
    Done,
}

impl TurnPhase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: TurnPhase) -> bool {
        use TurnPhase::*;
        matches!(
            (self, next),
            (AwaitingInput, ModelCalled)
                | (ModelCalled, ToolDetected)
                | (ModelCalled, Done)
                | (ToolDetected, ToolExecuted)
                | (ToolExecuted, FollowupCalled)
                | (FollowupCalled, Done)
                | (_, AwaitingInput)
        )
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::AwaitingInput => "awaiting_input",
            TurnPhase::ModelCalled => "model_called",
            TurnPhase::ToolDetected => "tool_detected",
            TurnPhase::ToolExecuted => "tool_executed",
            TurnPhase::FollowupCalled => "followup_called",
            TurnPhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_is_legal() {
        assert!(TurnPhase::AwaitingInput.can_advance_to(TurnPhase::ModelCalled));
        assert!(TurnPhase::ModelCalled.can_advance_to(TurnPhase::Done));
        assert!(TurnPhase::Done.can_advance_to(TurnPhase::AwaitingInput));
    }

    #[test]
    fn skipping_tool_execution_is_illegal() {
        assert!(!TurnPhase::ToolDetected.can_advance_to(TurnPhase::FollowupCalled));
        assert!(!TurnPhase::AwaitingInput.can_advance_to(TurnPhase::Done));
    }

    #[test]
    fn any_phase_can_reset() {
        assert!(TurnPhase::ToolExecuted.can_advance_to(TurnPhase::AwaitingInput));
    }

    #[test]
    fn default_options() {
        let opts = TurnOptions::default();
        assert!(opts.system_prompt.is_none());
        assert_eq!(opts.generation.max_output_tokens, 200);
    }
}
