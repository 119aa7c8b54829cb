//! Running token and cost totals since the last cache clear

use crate::config::UsageConfig;
use crate::core::TokenUsage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    pub tokens: TokenUsage,
    pub total_cost: f64,
}

#[derive(Debug, Clone)]
pub struct UsageAccumulator {
    rates: UsageConfig,
    totals: UsageTotals,
}

impl UsageAccumulator {
    pub fn new(rates: UsageConfig) -> Self {
        Self::with_totals(rates, UsageTotals::default())
    }

    pub fn with_totals(rates: UsageConfig, totals: UsageTotals) -> Self {
        Self { rates, totals }
    }

    /// Add one non-cached exchange. Cost is accumulated, never recomputed.
    /// Token counts come from the remote, so the sums saturate at `u64::MAX`.
    pub fn record(&mut self, tokens: TokenUsage) {
        let sum = &mut self.totals.tokens;
        sum.prompt_tokens = sum.prompt_tokens.saturating_add(tokens.prompt_tokens);
        sum.completion_tokens = sum
            .completion_tokens
            .saturating_add(tokens.completion_tokens);
        sum.total_tokens = sum.total_tokens.saturating_add(tokens.total_tokens);

        self.totals.total_cost += tokens.prompt_tokens as f64 * self.rates.input_rate
            + tokens.completion_tokens as f64 * self.rates.output_rate;
    }

    /// Only `ResponseCache::clear` resets the totals
    pub(crate) fn reset(&mut self) {
        self.totals = UsageTotals::default();
    }

    pub fn totals(&self) -> UsageTotals {
        self.totals
    }

    pub fn rates(&self) -> UsageConfig {
        self.rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: UsageConfig = UsageConfig {
        input_rate: 0.5,
        output_rate: 2.0,
    };

    #[test]
    fn test_record_accumulates() {
        let mut usage = UsageAccumulator::new(RATES);
        usage.record(TokenUsage::new(10, 5));
        usage.record(TokenUsage::new(20, 10));

        let totals = usage.totals();
        assert_eq!(totals.tokens, TokenUsage::new(30, 15));
        assert_eq!(totals.tokens.total_tokens, 45);
        assert_eq!(totals.total_cost, 30.0 * 0.5 + 15.0 * 2.0);
    }

    #[test]
    fn test_reset_zeroes() {
        let mut usage = UsageAccumulator::new(RATES);
        usage.record(TokenUsage::new(7, 3));
        usage.reset();

        assert_eq!(usage.totals(), UsageTotals::default());
        assert_eq!(usage.totals().total_cost, 0.0);
    }

    #[test]
    fn test_total_tokens_taken_as_reported() {
        let mut usage = UsageAccumulator::new(RATES);
        usage.record(TokenUsage {
            prompt_tokens: 1,
            completion_tokens: 1,
            total_tokens: 5,
        });
        assert_eq!(usage.totals().tokens.total_tokens, 5);
    }

    #[test]
    fn test_record_saturates_near_max() {
        let mut usage = UsageAccumulator::new(RATES);
        usage.record(TokenUsage {
            prompt_tokens: u64::MAX,
            completion_tokens: 0,
            total_tokens: u64::MAX,
        });
        usage.record(TokenUsage {
            prompt_tokens: 1,
            completion_tokens: u64::MAX,
            total_tokens: 1,
        });
        usage.record(TokenUsage::new(1, 1));

        let tokens = usage.totals().tokens;
        assert_eq!(tokens.prompt_tokens, u64::MAX);
        assert_eq!(tokens.completion_tokens, u64::MAX);
        assert_eq!(tokens.total_tokens, u64::MAX);
        assert!(usage.totals().total_cost.is_finite());
    }
}
