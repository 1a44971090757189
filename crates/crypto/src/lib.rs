//! Password-derived symmetric encryption of opaque JSON payloads.
//!
//! `encrypt`/`decrypt` operate on one-off values under an ephemeral
//! password — there is no long-lived sealed/unsealed vault state here,
//! unlike a DEK-wrapping vault: every share link carries its own salt and
//! nonce and is self-contained.
//!
//! Envelope: `base64url(salt(16) || nonce(24) || ciphertext || tag(16))`,
//! where the key is Argon2id(password, salt) and the cipher is
//! XChaCha20-Poly1305 over the canonical JSON encoding of the plaintext
//! value. Two encryptions of the same value under the same password are
//! indistinguishable byte-wise with overwhelming probability, since salt
//! and nonce are both drawn fresh from a CSPRNG on every call.

pub mod error;
pub mod kdf;
pub mod xchacha20;

use base64::Engine;
use kdf::KdfParams;
use serde_json::Value;
use tracing::{debug, warn};

pub use error::CryptoError;

const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Encrypt `value` under `password`, returning a base64url envelope.
pub fn encrypt(value: &Value, password: &str) -> Result<String, CryptoError> {
    let plaintext = serde_json::to_vec(value)?;

    let salt = kdf::generate_salt();
    let params = KdfParams::default();
    let key = kdf::derive_key(password.as_bytes(), &salt, &params)
        .map_err(|e| CryptoError::KdfFailed(e.to_string()))?;

    let sealed = xchacha20::seal(&key, &plaintext).map_err(|e| CryptoError::CipherError(e.to_string()))?;

    let mut envelope = Vec::with_capacity(kdf::SALT_LEN + sealed.len());
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&sealed);

    debug!(bytes = envelope.len(), "encrypted payload");
    Ok(B64.encode(envelope))
}

/// Decrypt a token produced by [`encrypt`]. Returns `None` for a wrong
/// password or any structurally invalid input — never an error into the
/// caller's success path, per the codec's fail-closed contract.
pub fn decrypt(token: &str, password: &str) -> Option<Value> {
    let envelope = match B64.decode(token) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "share token is not valid base64url");
            return None;
        },
    };

    if envelope.len() < kdf::SALT_LEN {
        return None;
    }
    let (salt_bytes, sealed) = envelope.split_at(kdf::SALT_LEN);
    let salt: [u8; kdf::SALT_LEN] = salt_bytes.try_into().ok()?;

    let params = KdfParams::default();
    let key = kdf::derive_key(password.as_bytes(), &salt, &params).ok()?;

    let plaintext = xchacha20::open(&key, sealed)?;
    serde_json::from_slice(&plaintext).ok()
}

/// Derive an 8-hex-digit namespace from `(title, subtitle)`: the first 4
/// bytes of SHA-256 over `"{title}|{subtitle}"`, lowercase hex. Pure and
/// deterministic; changing either input changes the output.
pub fn derive_namespace(title: &str, subtitle: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(subtitle.as_bytes());
    let digest = hasher.finalize();

    hex_lower(&digest[..4])
}

/// Derive a fallback symmetric key straight from the namespace string, for
/// use when no password-derived master key is available for a namespace.
/// Callers must flag every read/write under this key as a fallback, per
/// the fallback-namespace warning channel.
pub fn fallback_key(namespace: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(b"hackare-fallback-namespace:");
    hasher.update(namespace.as_bytes());
    hasher.finalize().into()
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let value = serde_json::json!({"apiKey": "sk-xyz", "model": "gpt-4o-mini"});
        let token = encrypt(&value, "pw").unwrap();
        assert_eq!(decrypt(&token, "pw"), Some(value));
    }

    #[test]
    fn wrong_password_returns_none() {
        let value = serde_json::json!({"a": 1});
        let token = encrypt(&value, "pw").unwrap();
        assert_eq!(decrypt(&token, "wrong"), None);
    }

    #[test]
    fn tampered_token_returns_none() {
        let value = serde_json::json!({"a": 1});
        let mut token = encrypt(&value, "pw").unwrap();
        // Flip a character deep in the base64 body (past the salt).
        let mid = token.len() / 2;
        let mut chars: Vec<char> = token.chars().collect();
        chars[mid] = if chars[mid] == 'a' { 'b' } else { 'a' };
        token = chars.into_iter().collect();
        assert_eq!(decrypt(&token, "pw"), None);
    }

    #[test]
    fn structurally_invalid_token_returns_none() {
        assert_eq!(decrypt("not valid base64url!!!", "pw"), None);
        assert_eq!(decrypt("", "pw"), None);
    }

    #[test]
    fn two_encryptions_of_same_value_differ() {
        let value = serde_json::json!({"a": 1});
        let t1 = encrypt(&value, "pw").unwrap();
        let t2 = encrypt(&value, "pw").unwrap();
        assert_ne!(t1, t2);
    }

    #[test]
    fn derive_namespace_is_pure_and_8_hex_chars() {
        let ns1 = derive_namespace("title", "subtitle");
        let ns2 = derive_namespace("title", "subtitle");
        assert_eq!(ns1, ns2);
        assert_eq!(ns1.len(), 8);
        assert!(ns1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn derive_namespace_changes_with_either_input() {
        let base = derive_namespace("A", "A");
        assert_ne!(base, derive_namespace("B", "A"));
        assert_ne!(base, derive_namespace("A", "B"));
    }
}
