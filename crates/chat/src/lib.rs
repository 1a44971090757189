//! Streaming chat engine: request/response cycles against an OpenAI-compatible
//! `/chat/completions` endpoint, with tool-call looping and history compaction.

pub mod compaction;
pub mod engine;
pub mod error;
pub mod message;
pub mod sse;

pub use engine::{AlwaysConfirm, ChatEngine, ConfirmPrompt, SendParams, ToolDispatcher, DEFAULT_MAX_TOOL_ITERATIONS};
pub use error::{ChatError, Result};
pub use message::{ChatMessage, Role, ToolCall};
pub use sse::{StreamEvent, StreamState, Usage};
