//! Share-link argument handling: recognizing a positional `gpt=<token>` or
//! full URL argument, prompting for its password on stdin, and applying the
//! decoded payload on top of the merged configuration.

use hackare_config::HackareConfig;
use hackare_share::SharePayload;

use crate::error::{CliError, Result};

/// True iff `arg` looks like a share link: either a bare `gpt=<token>` /
/// legacy `shared=<token>` fragment, or a full URL carrying one.
pub fn looks_like_share_link(arg: &str) -> bool {
    hackare_share::has_share_token(arg) || arg.starts_with("gpt=") || arg.starts_with("shared=")
}

/// Prompt for a non-echoing password on stdin, then decrypt `arg` into a
/// [`SharePayload`]. Returns [`CliError::ShareDecryptFailed`] on any failure
/// — wrong password, tampered token, or missing fragment — since the codec
/// deliberately makes these indistinguishable.
pub fn resolve_share_link(arg: &str) -> Result<SharePayload> {
    let url = if arg.contains('#') { arg.to_string() } else { format!("https://hacka.re/#{arg}") };

    let password = rpassword::prompt_password("Share link password: ").unwrap_or_default();
    hackare_share::extract_payload(&url, &password).ok_or(CliError::ShareDecryptFailed)
}

/// Apply the decoded payload's conversation, if present, replacing the
/// current history outright — never merging, per the share-link codec's
/// "replace current conversation" policy.
pub fn apply_conversation(payload: &SharePayload, history: &mut Vec<hackare_chat::ChatMessage>) {
    if payload.conversation.is_empty() {
        return;
    }
    history.clear();
    for raw in &payload.conversation {
        if let Ok(message) = serde_json::from_value(raw.clone()) {
            history.push(message);
        }
    }
}

/// Build a link for the current configuration and print it, per the
/// teacher's `channel_commands`-style "create and display" flow.
pub fn create_link_for(cfg: &HackareConfig, password: &str, allow_insecure: bool) -> Result<Option<String>> {
    let payload = SharePayload {
        api_key: cfg.api_key.clone(),
        base_url: Some(cfg.base_url.clone()),
        base_url_provider: Some(cfg.provider.clone()),
        model: Some(cfg.model.clone()),
        system_prompt: cfg.system_prompt.clone(),
        theme: Some(cfg.theme.clone()),
        ..Default::default()
    };
    let options = hackare_share::CreateLinkOptions { allow_insecure };
    Ok(hackare_share::create_link(&cfg.base_url, &payload, password, options)?)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_bare_fragment_and_full_url() {
        assert!(looks_like_share_link("gpt=abc123"));
        assert!(looks_like_share_link("https://hacka.re/#gpt=abc123"));
        assert!(!looks_like_share_link("chat"));
    }

    #[test]
    fn create_link_for_carries_the_active_config() {
        let cfg = HackareConfig { model: "gpt-4o".to_string(), ..HackareConfig::default() };
        let link = create_link_for(&cfg, "pw", false).unwrap().unwrap();
        let payload = hackare_share::extract_payload(&link, "pw").unwrap();
        assert_eq!(payload.model.as_deref(), Some("gpt-4o"));
    }
}
