//! Parses the OpenAI-compatible Server-Sent-Events stream into
//! [`StreamEvent`]s, merging tool-call argument deltas by index.
//!
//! Grounded on the teacher's shared `process_openai_sse_line` streaming
//! helper: one line of SSE `data: ` payload in, zero or more events out,
//! with an indexed tool-call accumulator carried across calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Token accounting reported at the end of a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A streamed event the chat engine reports to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Delta(String),
    ToolCallStart { index: usize, id: String, name: String },
    ToolCallArgumentsDelta { index: usize, delta: String },
    ToolCallComplete { index: usize },
    Done(Usage),
    Error(String),
}

#[derive(Debug, Clone, Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates partial tool-call deltas and running usage across a stream.
#[derive(Default)]
pub struct StreamState {
    tool_calls: HashMap<usize, PendingToolCall>,
    usage: Usage,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed `(id, name, arguments)` triples for every tool call seen so
    /// far, ordered by stream index.
    pub fn completed_tool_calls(&self) -> Vec<(usize, String, String, String)> {
        let mut calls: Vec<_> =
            self.tool_calls.iter().map(|(&index, call)| (index, call.id.clone(), call.name.clone(), call.arguments.clone())).collect();
        calls.sort_by_key(|(index, ..)| *index);
        calls
    }
}

/// Outcome of processing a single SSE line.
pub enum SseLineResult {
    Skip,
    Done,
    Events(Vec<StreamEvent>),
}

/// Process one `data: ` payload (with the `data: ` prefix already stripped).
pub fn process_sse_line(data: &str, state: &mut StreamState) -> SseLineResult {
    let data = data.trim();
    if data.is_empty() {
        return SseLineResult::Skip;
    }
    if data == "[DONE]" {
        return SseLineResult::Done;
    }

    let Ok(payload) = serde_json::from_str::<serde_json::Value>(data) else {
        return SseLineResult::Skip;
    };

    let mut events = Vec::new();

    if let Some(usage) = payload.get("usage") {
        if let Some(p) = usage.get("prompt_tokens").and_then(|v| v.as_u64()) {
            state.usage.prompt_tokens = p as u32;
        }
        if let Some(c) = usage.get("completion_tokens").and_then(|v| v.as_u64()) {
            state.usage.completion_tokens = c as u32;
        }
    }

    let delta = &payload["choices"][0]["delta"];

    if let Some(content) = delta["content"].as_str() {
        if !content.is_empty() {
            events.push(StreamEvent::Delta(content.to_string()));
        }
    }

    if let Some(tool_calls) = delta["tool_calls"].as_array() {
        for tc in tool_calls {
            let index = tc["index"].as_u64().unwrap_or(0) as usize;

            if let (Some(id), Some(name)) = (tc["id"].as_str(), tc["function"]["name"].as_str()) {
                state.tool_calls.insert(index, PendingToolCall { id: id.to_string(), name: name.to_string(), arguments: String::new() });
                events.push(StreamEvent::ToolCallStart { index, id: id.to_string(), name: name.to_string() });
            }

            if let Some(args_delta) = tc["function"]["arguments"].as_str() {
                if !args_delta.is_empty() {
                    if let Some(call) = state.tool_calls.get_mut(&index) {
                        call.arguments.push_str(args_delta);
                    }
                    events.push(StreamEvent::ToolCallArgumentsDelta { index, delta: args_delta.to_string() });
                }
            }
        }
    }

    if let Some(reason) = payload["choices"][0]["finish_reason"].as_str() {
        if reason == "tool_calls" || reason == "stop" {
            let mut indices: Vec<usize> = state.tool_calls.keys().copied().collect();
            indices.sort_unstable();
            for index in indices {
                events.push(StreamEvent::ToolCallComplete { index });
            }
        }
    }

    SseLineResult::Events(events)
}

/// Emit the closing `Done` event once the stream sentinel is reached, along
/// with completions for any tool call that never got a `finish_reason`.
pub fn finalize(state: &StreamState) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    let mut indices: Vec<usize> = state.tool_calls.keys().copied().collect();
    indices.sort_unstable();
    for index in indices {
        events.push(StreamEvent::ToolCallComplete { index });
    }
    events.push(StreamEvent::Done(state.usage));
    events
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_sentinel_is_recognized() {
        let mut state = StreamState::new();
        assert!(matches!(process_sse_line("[DONE]", &mut state), SseLineResult::Done));
    }

    #[test]
    fn blank_line_is_skipped() {
        let mut state = StreamState::new();
        assert!(matches!(process_sse_line("", &mut state), SseLineResult::Skip));
    }

    #[test]
    fn content_delta_is_emitted() {
        let mut state = StreamState::new();
        let line = r#"{"choices":[{"delta":{"content":"hel"}}]}"#;
        let SseLineResult::Events(events) = process_sse_line(line, &mut state) else { panic!("expected events") };
        assert_eq!(events, vec![StreamEvent::Delta("hel".to_string())]);
    }

    #[test]
    fn tool_call_deltas_merge_by_index() {
        let mut state = StreamState::new();
        let start = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"search","arguments":""}}]}}]}"#;
        process_sse_line(start, &mut state);

        let chunk1 = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"q\":"}}]}}]}"#;
        process_sse_line(chunk1, &mut state);

        let chunk2 = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"rust\"}"}}]}}]}"#;
        process_sse_line(chunk2, &mut state);

        let calls = state.completed_tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "call_1");
        assert_eq!(calls[0].2, "search");
        assert_eq!(calls[0].3, r#"{"q":"rust"}"#);
    }

    #[test]
    fn finish_reason_tool_calls_emits_completion() {
        let mut state = StreamState::new();
        let start = r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"search","arguments":"{}"}}]}}]}"#;
        process_sse_line(start, &mut state);

        let fin = r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#;
        let SseLineResult::Events(events) = process_sse_line(fin, &mut state) else { panic!("expected events") };
        assert!(events.contains(&StreamEvent::ToolCallComplete { index: 0 }));
    }

    #[test]
    fn usage_is_captured_from_final_chunk() {
        let mut state = StreamState::new();
        let line = r#"{"choices":[{"delta":{}}],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#;
        process_sse_line(line, &mut state);
        let events = finalize(&state);
        assert_eq!(events.last(), Some(&StreamEvent::Done(Usage { prompt_tokens: 10, completion_tokens: 5 })));
    }

    #[test]
    fn malformed_json_line_is_skipped() {
        let mut state = StreamState::new();
        assert!(matches!(process_sse_line("not json", &mut state), SseLineResult::Skip));
    }
}
