//! Encode and decode configuration bundles into URL fragment share links.
//!
//! Wire format: `<baseUrl>#gpt=<urlsafe-base64-encrypted-payload>`. The
//! legacy `#shared=...` fragment name is accepted on read, never written.
//! Every [`SharePayload`] field is optional and unknown JSON keys are
//! dropped silently on decode — this is the schema's only versioning
//! mechanism, so new fields must always be additive.

pub mod error;

use std::collections::HashMap;

pub use error::ShareError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Fragment key under which current links are written.
pub const FRAGMENT_KEY: &str = "gpt";
/// Legacy fragment key, accepted on read only.
const LEGACY_FRAGMENT_KEY: &str = "shared";

/// The fixed phrase used when a link is created with no password. Callers
/// must only reach this path in an explicit "insecure" mode and must treat
/// the resulting decryption as carrying a standing warning.
pub const FALLBACK_PASSWORD: &str = "hacka.re";

/// A configuration bundle carried by a share link. Every field is optional;
/// the empty payload `{}` is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub prompt_library: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_prompt_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_function_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub mcp_connections: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversation: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
}

/// Options controlling how a link is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateLinkOptions {
    /// The caller has explicitly acknowledged that an empty password falls
    /// back to [`FALLBACK_PASSWORD`] and must be created this way on
    /// purpose, not by accident.
    pub allow_insecure: bool,
}

/// Encrypt `payload` and append it to `base_url` as a `#gpt=` fragment.
///
/// An empty `password` requires `options.allow_insecure`, otherwise this
/// returns `None` rather than silently falling back.
pub fn create_link(
    base_url: &str,
    payload: &SharePayload,
    password: &str,
    options: CreateLinkOptions,
) -> Result<Option<String>, ShareError> {
    if password.is_empty() && !options.allow_insecure {
        return Ok(None);
    }
    let effective_password = if password.is_empty() { FALLBACK_PASSWORD } else { password };

    let value = serde_json::to_value(payload)?;
    let token =
        hackare_crypto::encrypt(&value, effective_password).map_err(|e| ShareError::Crypto(e.to_string()))?;

    let mut url = base_url.to_string();
    if let Some(hash_pos) = url.find('#') {
        url.truncate(hash_pos);
    }
    url.push('#');
    url.push_str(FRAGMENT_KEY);
    url.push('=');
    url.push_str(&token);
    Ok(Some(url))
}

/// True iff `url` carries a `#gpt=...` (or legacy `#shared=...`) fragment.
pub fn has_share_token(url: &str) -> bool {
    fragment_token(url).is_some()
}

/// Extract and decrypt the payload from a share link. Returns `None` if
/// there is no share fragment, the password is wrong, or the ciphertext is
/// tampered — decryption failure and "nothing to decode" are
/// indistinguishable to the caller by design.
pub fn extract_payload(url: &str, password: &str) -> Option<SharePayload> {
    let (legacy, token) = fragment_token(url)?;
    if legacy {
        warn!("share link uses the legacy #shared= fragment name");
    }

    let effective_password = if password.is_empty() { FALLBACK_PASSWORD } else { password };
    let value = hackare_crypto::decrypt(&token, effective_password)?;
    match serde_json::from_value(value) {
        Ok(payload) => Some(normalize(payload)),
        Err(e) => {
            warn!(error = %e, "share payload failed schema normalization");
            None
        },
    }
}

/// Return `url` with any share fragment stripped.
pub fn clear_fragment(url: &str) -> String {
    match url.find('#') {
        Some(pos) => url[..pos].to_string(),
        None => url.to_string(),
    }
}

/// Forward/backward schema normalization hook. Unknown fields were already
/// dropped during deserialization; this is the seam for field renames or
/// migrations as the payload schema evolves.
fn normalize(payload: SharePayload) -> SharePayload {
    payload
}

fn fragment_token(url: &str) -> Option<(bool, String)> {
    let fragment = url.split_once('#').map(|(_, f)| f)?;
    if let Some(token) = fragment.strip_prefix(&format!("{FRAGMENT_KEY}=")) {
        return Some((false, token.to_string()));
    }
    if let Some(token) = fragment.strip_prefix(&format!("{LEGACY_FRAGMENT_KEY}=")) {
        return Some((true, token.to_string()));
    }
    None
}
