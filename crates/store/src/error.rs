//! Namespaced store error types.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lock failed: {0}")]
    Lock(String),

    #[error("stored value for key {0:?} could not be decrypted")]
    DecryptFailed(String),
}
