//! Crypto codec error types.

/// Errors produced by encryption.
///
/// Decryption never surfaces one of these for a wrong password or tampered
/// input — per the codec's failure semantics, that case returns `None` from
/// [`crate::decrypt`], not an error. These variants cover structural
/// failures encountered while *encrypting*, or while serializing the KDF
/// parameters stored alongside the ciphertext.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    #[error("key derivation failed: {0}")]
    KdfFailed(String),

    #[error("cipher error: {0}")]
    CipherError(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
