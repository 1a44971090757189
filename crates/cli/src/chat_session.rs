//! Owns one shell's worth of chat state: history, the engine, and the
//! dispatch/confirm/cancellation plumbing `send` needs on every call.

use std::io::Write;

use hackare_chat::{AlwaysConfirm, ChatEngine, ChatMessage, SendParams, StreamEvent, DEFAULT_MAX_TOOL_ITERATIONS};
use hackare_config::HackareConfig;
use hackare_egress::EgressPolicy;
use hackare_prompts::PromptLibrary;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Result,
    tool_dispatch::{RegistryDispatcher, StdinConfirm},
};

pub struct ChatSession {
    engine: ChatEngine,
    pub history: Vec<ChatMessage>,
    pub config: HackareConfig,
    dispatcher: RegistryDispatcher,
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn new(config: HackareConfig, dispatcher: RegistryDispatcher) -> Self {
        Self { engine: ChatEngine::new(), history: vec![], config, dispatcher, cancel: CancellationToken::new() }
    }

    /// Recompose the system message from `library` and the registry's
    /// enabled tools, replacing any existing leading system message.
    pub fn refresh_system_prompt(&mut self, library: &mut PromptLibrary, enabled_tools: &[(String, String)]) {
        let composed = library.recompute(enabled_tools);
        let effective = self.config.system_prompt.clone().unwrap_or(composed);
        if !effective.is_empty() {
            let system = ChatMessage::system(effective);
            match self.history.first_mut() {
                Some(m) if m.role == hackare_chat::Role::System => *m = system,
                _ => self.history.insert(0, system),
            }
        }
    }

    /// A fresh cancellation token for the upcoming `send`, and a handle the
    /// caller can cancel from a concurrent `SIGINT` listener.
    pub fn new_cancel_token(&mut self) -> CancellationToken {
        self.cancel = CancellationToken::new();
        self.cancel.clone()
    }

    /// Send `user_text`, streaming deltas to stdout as they arrive.
    pub async fn send(&mut self, user_text: &str) -> Result<ChatMessage> {
        let params = SendParams {
            base_url: &self.config.base_url,
            api_key: self.config.api_key.as_deref(),
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: self.config.stream_mode,
            yolo_mode: self.config.yolo_mode,
            egress_policy: EgressPolicy {
                offline_mode: self.config.offline_mode,
                allow_remote_mcp: self.config.allow_remote_mcp,
                allow_remote_embeddings: self.config.allow_remote_embeddings,
            },
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        };

        let confirm = StdinConfirm;
        let reply = if self.config.yolo_mode {
            self.engine
                .send(&mut self.history, user_text, &params, &self.dispatcher, &AlwaysConfirm, &self.cancel, on_stream_event)
                .await?
        } else {
            self.engine
                .send(&mut self.history, user_text, &params, &self.dispatcher, &confirm, &self.cancel, on_stream_event)
                .await?
        };
        println!();
        Ok(reply)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drop all non-system messages, per C7's `clear()` contract.
    pub fn clear(&mut self) {
        self.history.retain(|m| m.role == hackare_chat::Role::System);
    }

    /// Compact earlier history into a summary once estimated tokens exceed
    /// `threshold_tokens`, keeping the most recent `keep_last` messages.
    pub fn compact(&mut self, threshold_tokens: u32, keep_last: usize) {
        self.history = hackare_chat::compaction::compact(&self.history, threshold_tokens, keep_last);
    }
}

fn on_stream_event(event: &StreamEvent) {
    if let StreamEvent::Delta(text) = event {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}
