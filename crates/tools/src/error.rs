//! Tool registry and scripting runtime errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("tool {name} not found")]
    NotFound { name: String },

    #[error("tool {name} timed out")]
    Timeout { name: String },

    #[error("tool {name} failed: {message}")]
    Runtime { name: String, message: String },

    #[error("invalid arguments for {name}: {message}")]
    InvalidArguments { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, ToolError>;
