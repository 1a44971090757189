//! Egress policy error types.

use crate::Classification;

/// A denied outbound request, carrying enough context to explain itself
/// without the caller needing to re-derive anything.
#[derive(Debug, thiserror::Error)]
#[error("egress denied: {classification} request to {url} ({rule})")]
pub struct EgressDenied {
    pub classification: Classification,
    pub url: String,
    pub rule: &'static str,
}

pub type Result<T> = std::result::Result<T, EgressDenied>;
