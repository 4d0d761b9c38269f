//! Token usage accounting for a chat session.

use std::collections::BTreeMap;
use std::fmt;

use crate::TokenUsage;

/// Cumulative token usage, split by provider.
#[derive(Debug, Default, Clone)]
pub struct TokenTracker {
    total: TokenUsage,
    by_provider: BTreeMap<String, TokenUsage>,
    /// Model calls made, follow-ups included.
    calls: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the usage reported by one model call.
    pub fn record(&mut self, provider: &str, usage: &TokenUsage) {
        add_into(&mut self.total, usage);
        add_into(self.by_provider.entry(provider.to_string()).or_default(), usage);
        self.calls += 1;
    }

    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens()
    }

    pub fn call_count(&self) -> u64 {
        self.calls
    }
}

fn add_into(acc: &mut TokenUsage, usage: &TokenUsage) {
    acc.input_tokens = acc.input_tokens.saturating_add(usage.input_tokens);
    acc.output_tokens = acc.output_tokens.saturating_add(usage.output_tokens);
}

/// One summary line per provider, for the REPL `usage` command.
impl fmt::Display for TokenTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.calls == 0 {
            return f.write_str("📊 No model calls yet.");
        }
        write!(
            f,
            "📊 {} calls, {} tokens ({} in / {} out)",
            self.calls,
            self.total_tokens(),
            self.total.input_tokens,
            self.total.output_tokens
        )?;
        for (provider, usage) in &self.by_provider {
            write!(
                f,
                "\n   {provider}: {} in / {} out",
                usage.input_tokens, usage.output_tokens
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(input: u64, output: u64) -> TokenUsage {
        TokenUsage {
            input_tokens: input,
            output_tokens: output,
        }
    }

    #[test]
    fn records_accumulate_per_provider() {
        let mut t = TokenTracker::new();
        t.record("gemini", &usage(10, 4));
        t.record("gemini", &usage(6, 2));
        assert_eq!(t.call_count(), 2);
        assert_eq!(t.total_tokens(), 22);
        t.record("other", &usage(1, 1));
        let text = t.to_string();
        assert!(text.contains("gemini: 16 in / 6 out"));
        assert!(text.contains("other: 1 in / 1 out"));
    }

    #[test]
    fn display_summarises_usage() {
        let mut t = TokenTracker::new();
        assert_eq!(t.to_string(), "📊 No model calls yet.");
        t.record("gemini", &usage(10, 5));
        let text = t.to_string();
        assert!(text.starts_with("📊 1 calls, 15 tokens (10 in / 5 out)"));
        assert!(text.contains("gemini: 10 in / 5 out"));
    }
}
