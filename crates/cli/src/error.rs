//! The CLI's top-level error type: every subcommand funnels its failure
//! through here so `main` can print exactly one `[<kind>] message` line and
//! exit with the code the kind maps to, per the CLI's propagation policy.

use hackare_common::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] hackare_config::ConfigError),

    #[error(transparent)]
    Store(#[from] hackare_store::StoreError),

    #[error(transparent)]
    Share(#[from] hackare_share::ShareError),

    #[error(transparent)]
    Chat(#[from] hackare_chat::ChatError),

    #[error(transparent)]
    Server(#[from] hackare_server::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("share link could not be decrypted with the given password")]
    ShareDecryptFailed,

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Store(_) | Self::Server(_) | Self::Io(_) => ErrorKind::Server,
            Self::Share(_) | Self::ShareDecryptFailed => ErrorKind::DecryptFailed,
            Self::Chat(e) => e.kind(),
            Self::Usage(_) => ErrorKind::Usage,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
