//! Chat engine error types, tagged with the shared [`hackare_common::error::ErrorKind`]
//! taxonomy per the CLI's one-line failure-message contract.

use hackare_common::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("provider server error: {0}")]
    Server(String),

    #[error(transparent)]
    EgressDenied(#[from] hackare_egress::EgressDenied),

    #[error("tool {name} timed out")]
    ToolTimeout { name: String },

    #[error("tool {name} failed: {source}")]
    ToolRuntime { name: String, source: Box<dyn std::error::Error + Send + Sync> },

    #[error("request cancelled")]
    Cancelled,

    #[error("tool-call loop exceeded {0} iterations")]
    ToolLoopExceeded(u32),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Auth(_) => ErrorKind::Auth,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Server(_) | Self::ToolLoopExceeded(_) => ErrorKind::Server,
            Self::EgressDenied(_) => ErrorKind::EgressDenied,
            Self::ToolTimeout { .. } => ErrorKind::ToolTimeout,
            Self::ToolRuntime { .. } => ErrorKind::ToolRuntime,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
