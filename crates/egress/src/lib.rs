//! Classifies outgoing HTTP requests and enforces the offline/allow-remote
//! egress policy.
//!
//! `classify` is a pure function of the URL path; `permit` is a pure
//! function of a classification and the current policy. Neither performs
//! I/O — callers (the chat engine, the tool registry, the embeddings path)
//! run both before dialing out.

pub mod error;

use std::fmt;

pub use error::{EgressDenied, Result};
use url::Url;

/// What kind of traffic a URL represents, for policy purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Llm,
    Mcp,
    Embeddings,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Llm => "LLM",
            Self::Mcp => "MCP",
            Self::Embeddings => "Embeddings",
        })
    }
}

/// Classify a URL by path, checked in order: `/embeddings` → Embeddings;
/// `/mcp`, `/tools`, `/functions`, or a literal `model-context` token → MCP;
/// otherwise LLM.
pub fn classify(url: &str) -> Classification {
    let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_else(|_| url.to_string());

    if path.contains("/embeddings") {
        return Classification::Embeddings;
    }
    if path.contains("/mcp") || path.contains("/tools") || path.contains("/functions") || path.contains("model-context") {
        return Classification::Mcp;
    }
    Classification::Llm
}

/// The three egress knobs from the live configuration that `permit` needs.
/// Kept as plain fields rather than taking `hackare_config::HackareConfig`
/// directly, so this crate has no dependency on the config schema.
#[derive(Debug, Clone, Copy)]
pub struct EgressPolicy {
    pub offline_mode: bool,
    pub allow_remote_mcp: bool,
    pub allow_remote_embeddings: bool,
}

/// Decide whether a request of the given classification to `url` is
/// permitted under `policy`.
pub fn permit(url: &str, classification: Classification, policy: EgressPolicy) -> Result<()> {
    if !policy.offline_mode {
        return Ok(());
    }

    match classification {
        Classification::Llm => {
            if is_loopback(url) {
                Ok(())
            } else {
                Err(EgressDenied { classification, url: url.to_string(), rule: "offline mode requires LLM traffic to stay on loopback" })
            }
        },
        Classification::Mcp => {
            if policy.allow_remote_mcp || is_loopback(url) {
                Ok(())
            } else {
                Err(EgressDenied { classification, url: url.to_string(), rule: "offline mode blocks remote MCP traffic unless allowRemoteMcp is set" })
            }
        },
        Classification::Embeddings => {
            if policy.allow_remote_embeddings || is_loopback(url) {
                Ok(())
            } else {
                Err(EgressDenied {
                    classification,
                    url: url.to_string(),
                    rule: "offline mode blocks remote embeddings traffic unless allowRemoteEmbeddings is set",
                })
            }
        },
    }
}

/// True iff `url` has an `http`/`https` scheme and a loopback host
/// (`localhost`, `127.0.0.1`, `::1`, case-insensitive).
pub fn is_loopback(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else { return false };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else { return false };
    matches!(host.to_ascii_lowercase().as_str(), "localhost" | "127.0.0.1" | "::1")
}
