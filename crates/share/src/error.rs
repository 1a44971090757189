//! Share-link codec error types.

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("url is missing a share fragment")]
    NoFragment,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("encryption failed: {0}")]
    Crypto(String),
}
