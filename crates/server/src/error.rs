#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read embedded asset archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("asset io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
