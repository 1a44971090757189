//! Prompt library: curated and user prompts, composed into the effective
//! system prompt, plus a context-budget estimator.

pub mod library;
pub mod prompt;
pub mod tokens;

pub use library::PromptLibrary;
pub use prompt::Prompt;
pub use tokens::{estimate_tokens, TokenEstimate};
