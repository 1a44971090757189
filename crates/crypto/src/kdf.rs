//! Argon2id key derivation for password → symmetric key.
//!
//! Parameters are fixed and documented, chosen once and never changed:
//! deployed share links must still decrypt under the same parameters.

use argon2::Argon2;
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const SALT_LEN: usize = 16;

/// Argon2id parameters. Pinned per the wire format this codec interoperates
/// with; never vary these across releases.
#[derive(Debug, Clone, Copy)]
pub struct KdfParams {
    /// Memory cost in KiB (64 MiB).
    pub m_cost: u32,
    /// Iteration count.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 1,
        }
    }
}

/// Derive a 256-bit key from a password and salt using Argon2id.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let argon2_params = argon2::Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| CryptoError::InvalidKdfParams(e.to_string()))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password, salt, output.as_mut())
        .map_err(|e| CryptoError::KdfFailed(e.to_string()))?;

    Ok(output)
}

/// Generate a fresh random salt from a cryptographically strong source.
pub fn generate_salt() -> [u8; SALT_LEN] {
    use rand::RngCore;

    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn low_cost_params() -> KdfParams {
        KdfParams {
            m_cost: 256,
            t_cost: 1,
            p_cost: 1,
        }
    }

    #[test]
    fn derive_key_deterministic() {
        let params = low_cost_params();
        let salt = *b"test-salt-16byte";

        let key1 = derive_key(b"password", &salt, &params).unwrap();
        let key2 = derive_key(b"password", &salt, &params).unwrap();
        assert_eq!(*key1, *key2);
    }

    #[test]
    fn different_passwords_different_keys() {
        let params = low_cost_params();
        let salt = *b"test-salt-16byte";

        let key1 = derive_key(b"password1", &salt, &params).unwrap();
        let key2 = derive_key(b"password2", &salt, &params).unwrap();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn different_salts_different_keys() {
        let params = low_cost_params();

        let key1 = derive_key(b"password", b"salt-aaaaaaaaaaaa", &params).unwrap();
        let key2 = derive_key(b"password", b"salt-bbbbbbbbbbbb", &params).unwrap();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn generate_salt_is_fresh_each_time() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
