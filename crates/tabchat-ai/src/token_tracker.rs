//! Token usage tracking per session.

use crate::TokenUsage;

/// Cumulative token usage and API call count for one session.
#[derive(Debug, Default)]
pub struct TokenTracker {
    total: TokenUsage,
    call_count: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record token usage from an API call.
    pub fn record(&mut self, usage: &TokenUsage) {
        self.total.input_tokens += usage.input_tokens;
        self.total.output_tokens += usage.output_tokens;
        self.call_count += 1;
    }

    pub fn total(&self) -> &TokenUsage {
        &self.total
    }

    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens()
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    pub fn reset(&mut self) {
        self.total = TokenUsage::default();
        self.call_count = 0;
    }
}
