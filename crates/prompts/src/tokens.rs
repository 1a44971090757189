//! Context-budget estimator: a 4-characters-per-token heuristic against the
//! active model's context window.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenEstimate {
    pub tokens: u32,
    pub context_size: u32,
    pub percentage: f64,
}

pub fn estimate_tokens(text: &str, context_size: u32) -> TokenEstimate {
    let tokens = if text.is_empty() { 0 } else { ((text.len() as f64) / 4.0).ceil() as u32 };
    let percentage = if context_size == 0 { 0.0 } else { (f64::from(tokens) / f64::from(context_size)) * 100.0 };
    TokenEstimate { tokens, context_size, percentage }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_estimates_zero_tokens() {
        let estimate = estimate_tokens("", 4096);
        assert_eq!(estimate.tokens, 0);
        assert_eq!(estimate.percentage, 0.0);
    }

    #[test]
    fn estimates_four_chars_per_token_rounded_up() {
        let estimate = estimate_tokens("123456789", 4096);
        assert_eq!(estimate.tokens, 3);
    }

    #[test]
    fn percentage_reflects_context_window_usage() {
        let estimate = estimate_tokens(&"x".repeat(400), 1000);
        assert_eq!(estimate.tokens, 100);
        assert_eq!(estimate.percentage, 10.0);
    }

    #[test]
    fn zero_context_size_does_not_divide_by_zero() {
        let estimate = estimate_tokens("hello", 0);
        assert_eq!(estimate.percentage, 0.0);
    }
}
