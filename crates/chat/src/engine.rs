//! The streaming chat engine: one request/response cycle, looped while the
//! assistant keeps requesting tool calls.

use futures_util::StreamExt;
use hackare_egress::{Classification, EgressPolicy};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::{ChatError, Result},
    message::{ChatMessage, Role, ToolCall},
    sse::{self, StreamEvent, StreamState, Usage},
};

/// Default cap on tool-call loop iterations within a single [`send`] call.
pub const DEFAULT_MAX_TOOL_ITERATIONS: u32 = 8;

/// Parameters for one `send` cycle. Borrowed rather than owned by
/// [`ChatEngine`] so callers can change model/provider between sends without
/// reconstructing the engine.
#[derive(Debug, Clone)]
pub struct SendParams<'a> {
    pub base_url: &'a str,
    pub api_key: Option<&'a str>,
    pub model: &'a str,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub stream: bool,
    pub yolo_mode: bool,
    pub egress_policy: EgressPolicy,
    pub max_tool_iterations: u32,
}

/// Dispatches a completed tool call to its implementation. Implemented by
/// the tool registry; kept as a trait here so the engine can be tested
/// without depending on the scripting runtime.
#[async_trait::async_trait]
pub trait ToolDispatcher: Send + Sync {
    async fn call(&self, name: &str, arguments_json: &str) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// The OpenAI-compatible tool schemas to advertise, or empty if no
    /// callable function is currently enabled.
    fn tool_schemas(&self) -> Vec<serde_json::Value>;
}

/// Confirms a tool call with the user when `yoloMode` is off.
#[async_trait::async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, tool_name: &str, arguments_json: &str) -> bool;
}

/// Always approves every tool call — the `yoloMode` confirmer.
pub struct AlwaysConfirm;

#[async_trait::async_trait]
impl ConfirmPrompt for AlwaysConfirm {
    async fn confirm(&self, _tool_name: &str, _arguments_json: &str) -> bool {
        true
    }
}

/// The streaming chat engine. Stateless across calls — history lives in the
/// caller's message vector, passed by mutable reference to [`send`].
pub struct ChatEngine {
    client: reqwest::Client,
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatEngine {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    /// Append `user_text` to `history` and run completion cycles (dispatching
    /// tool calls as needed) until the assistant responds with no further
    /// tool calls, the iteration cap is hit, or `cancel` is triggered.
    /// `on_event` is called for every streamed chunk, in receipt order.
    #[allow(clippy::too_many_arguments)]
    pub async fn send(
        &self,
        history: &mut Vec<ChatMessage>,
        user_text: &str,
        params: &SendParams<'_>,
        dispatcher: &dyn ToolDispatcher,
        confirm: &dyn ConfirmPrompt,
        cancel: &CancellationToken,
        mut on_event: impl FnMut(&StreamEvent),
    ) -> Result<ChatMessage> {
        history.push(ChatMessage::user(user_text));

        let mut iterations = 0u32;
        loop {
            let tools = dispatcher.tool_schemas();
            let (assistant_message, usage) = self.run_one_cycle(history, params, &tools, cancel, &mut on_event).await?;
            debug!(usage = ?usage, "completion cycle finished");

            if !assistant_message.has_tool_calls() {
                history.push(assistant_message.clone());
                return Ok(assistant_message);
            }

            iterations += 1;
            if iterations > params.max_tool_iterations {
                let fatal = ChatMessage::assistant("[tool-call loop limit exceeded, aborting]");
                history.push(fatal.clone());
                return Err(ChatError::ToolLoopExceeded(params.max_tool_iterations));
            }

            history.push(assistant_message.clone());
            for call in &assistant_message.tool_calls {
                if cancel.is_cancelled() {
                    return Err(ChatError::Cancelled);
                }
                self.dispatch_tool_call(history, call, params, dispatcher, confirm).await?;
            }
        }
    }

    async fn dispatch_tool_call(
        &self,
        history: &mut Vec<ChatMessage>,
        call: &ToolCall,
        params: &SendParams<'_>,
        dispatcher: &dyn ToolDispatcher,
        confirm: &dyn ConfirmPrompt,
    ) -> Result<()> {
        if !params.yolo_mode && !confirm.confirm(&call.name, &call.arguments).await {
            history.push(ChatMessage::tool_result(call.id.clone(), "[tool call declined by user]"));
            return Ok(());
        }

        let classification = hackare_egress::classify(&format!("{}/tools/{}", params.base_url, call.name));
        hackare_egress::permit(params.base_url, classification, params.egress_policy)?;

        match dispatcher.call(&call.name, &call.arguments).await {
            Ok(result) => history.push(ChatMessage::tool_result(call.id.clone(), result)),
            Err(source) => {
                warn!(tool = %call.name, error = %source, "tool call failed");
                let body = json!({ "success": false, "error": source.to_string() }).to_string();
                history.push(ChatMessage::tool_result(call.id.clone(), body));
            },
        }
        Ok(())
    }

    async fn run_one_cycle(
        &self,
        history: &[ChatMessage],
        params: &SendParams<'_>,
        tools: &[serde_json::Value],
        cancel: &CancellationToken,
        on_event: &mut impl FnMut(&StreamEvent),
    ) -> Result<(ChatMessage, Usage)> {
        let url = format!("{}/chat/completions", params.base_url.trim_end_matches('/'));
        let classification = hackare_egress::classify(&url);
        hackare_egress::permit(&url, classification, params.egress_policy)?;

        let mut body = json!({
            "model": params.model,
            "temperature": params.temperature,
            "messages": history,
            "stream": params.stream,
        });
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = params.api_key.filter(|k| !k.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(ChatError::Transport)?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ChatError::Auth(status.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatError::RateLimited(status.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Server(format!("{status}: {body}")));
        }

        if params.stream {
            self.read_stream(response, cancel, on_event).await
        } else {
            self.read_single_response(response).await
        }
    }

    async fn read_single_response(&self, response: reqwest::Response) -> Result<(ChatMessage, Usage)> {
        let payload: serde_json::Value = response.json().await.map_err(ChatError::Transport)?;
        let message = &payload["choices"][0]["message"];

        let content = message["content"].as_str().unwrap_or_default().to_string();
        let tool_calls = message["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|tc| {
                        Some(ToolCall {
                            id: tc["id"].as_str()?.to_string(),
                            name: tc["function"]["name"].as_str()?.to_string(),
                            arguments: tc["function"]["arguments"].as_str().unwrap_or("{}").to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let usage = Usage {
            prompt_tokens: payload["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: payload["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        Ok((ChatMessage { role: Role::Assistant, content, name: None, tool_call_id: None, tool_calls }, usage))
    }

    async fn read_stream(
        &self,
        response: reqwest::Response,
        cancel: &CancellationToken,
        on_event: &mut impl FnMut(&StreamEvent),
    ) -> Result<(ChatMessage, Usage)> {
        let mut byte_stream = response.bytes_stream();
        let mut pending_bytes: Vec<u8> = Vec::new();
        let mut buffer = String::new();
        let mut content = String::new();
        let mut state = StreamState::new();

        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    content.push_str(" [interrupted]");
                    let calls = Self::tool_calls_from_state(&state);
                    return Ok((
                        ChatMessage { role: Role::Assistant, content, name: None, tool_call_id: None, tool_calls: calls },
                        Usage::default(),
                    ));
                },
                chunk = byte_stream.next() => chunk,
            };

            let Some(chunk) = chunk else { break };
            let chunk = chunk.map_err(ChatError::Transport)?;
            pending_bytes.extend_from_slice(&chunk);
            buffer.push_str(&Self::drain_valid_utf8(&mut pending_bytes));

            let mut done = false;
            while let Some(newline_pos) = buffer.find('\n') {
                let line = buffer[..newline_pos].trim_end_matches('\r').to_string();
                buffer.drain(..=newline_pos);

                let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else { continue };
                match sse::process_sse_line(data, &mut state) {
                    sse::SseLineResult::Skip => {},
                    sse::SseLineResult::Done => {
                        done = true;
                        break;
                    },
                    sse::SseLineResult::Events(events) => {
                        for event in &events {
                            if let StreamEvent::Delta(text) = event {
                                content.push_str(text);
                            }
                            on_event(event);
                        }
                    },
                }
            }
            if done {
                break;
            }
        }

        for event in sse::finalize(&state) {
            on_event(&event);
        }

        let usage = match sse::finalize(&state).into_iter().find_map(|e| if let StreamEvent::Done(u) = e { Some(u) } else { None }) {
            Some(u) => u,
            None => Usage::default(),
        };

        let tool_calls = Self::tool_calls_from_state(&state);
        Ok((ChatMessage { role: Role::Assistant, content, name: None, tool_call_id: None, tool_calls }, usage))
    }

    fn tool_calls_from_state(state: &StreamState) -> Vec<ToolCall> {
        state.completed_tool_calls().into_iter().map(|(_, id, name, arguments)| ToolCall { id, name, arguments }).collect()
    }

    /// Drains the valid-UTF-8 prefix of `pending`, leaving any trailing
    /// incomplete multi-byte sequence in place for the next chunk to
    /// complete. A chunk boundary splitting a codepoint must never surface
    /// a replacement character mid-stream.
    fn drain_valid_utf8(pending: &mut Vec<u8>) -> String {
        let valid_up_to = match std::str::from_utf8(pending) {
            Ok(s) => s.len(),
            Err(e) => e.valid_up_to(),
        };
        String::from_utf8(pending.drain(..valid_up_to).collect()).unwrap_or_default()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use mockito::Server;

    use super::*;

    fn policy() -> EgressPolicy {
        EgressPolicy { offline_mode: false, allow_remote_mcp: false, allow_remote_embeddings: false }
    }

    struct NoTools;

    #[async_trait::async_trait]
    impl ToolDispatcher for NoTools {
        async fn call(&self, _name: &str, _arguments_json: &str) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Ok(String::new())
        }
        fn tool_schemas(&self) -> Vec<serde_json::Value> {
            vec![]
        }
    }

    #[tokio::test]
    async fn non_streaming_send_returns_assistant_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"hello there"}}],"usage":{"prompt_tokens":3,"completion_tokens":2}}"#)
            .create_async()
            .await;

        let engine = ChatEngine::new();
        let mut history = vec![];
        let params = SendParams {
            base_url: &server.url(),
            api_key: Some("sk-test"),
            model: "gpt-4o-mini",
            temperature: 0.0,
            max_tokens: None,
            stream: false,
            yolo_mode: true,
            egress_policy: policy(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        };

        let reply = engine
            .send(&mut history, "hi", &params, &NoTools, &AlwaysConfirm, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(reply.content, "hello there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn streaming_send_concatenates_deltas_in_order() {
        let mut server = Server::new_async().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"he\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let engine = ChatEngine::new();
        let mut history = vec![];
        let params = SendParams {
            base_url: &server.url(),
            api_key: None,
            model: "gpt-4o-mini",
            temperature: 0.0,
            max_tokens: None,
            stream: true,
            yolo_mode: true,
            egress_policy: policy(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        };

        let mut deltas = vec![];
        let reply = engine
            .send(&mut history, "hi", &params, &NoTools, &AlwaysConfirm, &CancellationToken::new(), |event| {
                if let StreamEvent::Delta(text) = event {
                    deltas.push(text.clone());
                }
            })
            .await
            .unwrap();

        assert_eq!(reply.content, "hello");
        assert_eq!(deltas, vec!["he".to_string(), "llo".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_status_surfaces_as_auth_error() {
        let mut server = Server::new_async().await;
        server.mock("POST", "/chat/completions").with_status(401).create_async().await;

        let engine = ChatEngine::new();
        let mut history = vec![];
        let params = SendParams {
            base_url: &server.url(),
            api_key: Some("sk-bad"),
            model: "gpt-4o-mini",
            temperature: 0.0,
            max_tokens: None,
            stream: false,
            yolo_mode: true,
            egress_policy: policy(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        };

        let err = engine
            .send(&mut history, "hi", &params, &NoTools, &AlwaysConfirm, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Auth(_)));
    }

    #[test]
    fn drain_valid_utf8_buffers_a_codepoint_split_across_chunks() {
        // "é" (U+00E9) is encoded as 0xC3 0xA9 — split the two bytes across
        // separate chunks the way a TCP/HTTP boundary could.
        let full = "caf\u{e9}".as_bytes().to_vec();
        let (first, second) = full.split_at(full.len() - 1);

        let mut pending = first.to_vec();
        let decoded_first = ChatEngine::drain_valid_utf8(&mut pending);
        assert_eq!(decoded_first, "caf");
        assert_eq!(pending, vec![0xC3]);

        pending.extend_from_slice(second);
        let decoded_second = ChatEngine::drain_valid_utf8(&mut pending);
        assert_eq!(decoded_second, "\u{e9}");
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn offline_mode_denies_a_remote_endpoint_before_any_request_is_sent() {
        let engine = ChatEngine::new();
        let mut history = vec![];
        let params = SendParams {
            base_url: "https://api.openai.com/v1",
            api_key: Some("sk-test"),
            model: "gpt-4o-mini",
            temperature: 0.0,
            max_tokens: None,
            stream: false,
            yolo_mode: true,
            egress_policy: EgressPolicy { offline_mode: true, allow_remote_mcp: false, allow_remote_embeddings: false },
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        };

        let err = engine
            .send(&mut history, "hi", &params, &NoTools, &AlwaysConfirm, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EgressDenied(_)));
    }

    #[tokio::test]
    async fn tool_loop_exceeding_the_iteration_cap_aborts() {
        let mut server = Server::new_async().await;
        let body = r#"{"choices":[{"message":{"content":"","tool_calls":[
            {"id":"call_1","function":{"name":"noop","arguments":"{}"}}
        ]}}],"usage":{"prompt_tokens":1,"completion_tokens":1}}"#;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(2)
            .create_async()
            .await;

        let engine = ChatEngine::new();
        let mut history = vec![];
        let params = SendParams {
            base_url: &server.url(),
            api_key: Some("sk-test"),
            model: "gpt-4o-mini",
            temperature: 0.0,
            max_tokens: None,
            stream: false,
            yolo_mode: true,
            egress_policy: policy(),
            max_tool_iterations: 1,
        };

        let err = engine
            .send(&mut history, "hi", &params, &NoTools, &AlwaysConfirm, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ToolLoopExceeded(1)));
        mock.assert_async().await;
    }
}
