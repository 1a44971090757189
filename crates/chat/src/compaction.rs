//! History compaction: once estimated token usage crosses a configured
//! threshold, collapse everything but the most recent messages into one
//! summarization message.

use crate::message::{ChatMessage, Role};

/// Rough token estimate: 4 characters per token, matching the prompt
/// library's context-budget heuristic.
pub fn estimate_tokens(messages: &[ChatMessage]) -> u32 {
    let chars: usize = messages.iter().map(|m| m.content.len()).sum();
    (chars / 4).max(1) as u32
}

/// Rewrite `history` into a single summarization message plus the most
/// recent `keep_last` messages, if `estimate_tokens(history)` exceeds
/// `threshold_tokens`. Leaves `history` untouched otherwise. The system
/// message (if `history[0]` is one) is always preserved ahead of the
/// summary.
pub fn compact(history: &[ChatMessage], threshold_tokens: u32, keep_last: usize) -> Vec<ChatMessage> {
    if estimate_tokens(history) <= threshold_tokens {
        return history.to_vec();
    }

    let (system, rest) = match history.first() {
        Some(m) if m.role == Role::System => (Some(m.clone()), &history[1..]),
        _ => (None, history),
    };

    let keep_from = rest.len().saturating_sub(keep_last);
    let (to_summarize, recent) = rest.split_at(keep_from);

    let mut result = Vec::with_capacity(3 + recent.len());
    if let Some(system) = system {
        result.push(system);
    }
    if !to_summarize.is_empty() {
        let summary = summarize(to_summarize);
        result.push(ChatMessage::assistant(summary));
    }
    result.extend_from_slice(recent);
    result
}

fn summarize(messages: &[ChatMessage]) -> String {
    format!("[compacted {} earlier message(s)]", messages.len())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn long_message() -> ChatMessage {
        ChatMessage::user("x".repeat(400))
    }

    #[test]
    fn leaves_history_untouched_below_threshold() {
        let history = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let compacted = compact(&history, 10_000, 4);
        assert_eq!(compacted, history);
    }

    #[test]
    fn compacts_when_over_threshold_and_preserves_system_and_recent() {
        let mut history = vec![ChatMessage::system("sys")];
        for _ in 0..10 {
            history.push(long_message());
        }
        history.push(ChatMessage::user("most recent"));

        let compacted = compact(&history, 50, 2);
        assert_eq!(compacted[0].role, Role::System);
        assert!(compacted[1].content.starts_with("[compacted"));
        assert_eq!(compacted.last().unwrap().content, "most recent");
        assert!(compacted.len() < history.len());
    }

    #[test]
    fn compacts_without_a_leading_system_message() {
        let mut history = vec![];
        for _ in 0..10 {
            history.push(long_message());
        }
        let compacted = compact(&history, 50, 1);
        assert_eq!(compacted[0].role, Role::Assistant);
    }
}
