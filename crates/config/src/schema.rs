//! The effective runtime configuration and its serializable snapshot.

use serde::{Deserialize, Serialize};

/// The live, effective configuration, per spec §4.4: provider/connection
/// settings, chat behavior, and the egress posture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HackareConfig {
    pub provider: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub stream_mode: bool,
    pub yolo_mode: bool,
    pub system_prompt: Option<String>,
    pub theme: String,
    pub namespace: Option<String>,
    pub offline_mode: bool,
    pub allow_remote_mcp: bool,
    pub allow_remote_embeddings: bool,
    /// Set when a share-link payload named a provider/baseUrl the egress
    /// policy forbids, so `baseUrl` was overridden to [`OFFLINE_BASE_URL`]
    /// instead of the payload's own value. See spec §4.3.
    pub forced_local: bool,
}

impl Default for HackareConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: None,
            stream_mode: true,
            yolo_mode: false,
            system_prompt: None,
            theme: "default".to_string(),
            namespace: None,
            offline_mode: false,
            allow_remote_mcp: false,
            allow_remote_embeddings: false,
            forced_local: false,
        }
    }
}

/// Localhost default used when `offlineMode` forces `baseUrl` to a local
/// endpoint, per the CLI-wins override rule in spec §4.4.
pub const OFFLINE_BASE_URL: &str = "http://127.0.0.1:11434/v1";

impl HackareConfig {
    /// Serializable view for the `/config` REPL command and the `config`
    /// CLI subcommand's `get`/`edit` output. The API key is never included.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            provider: self.provider.clone(),
            base_url: self.base_url.clone(),
            has_api_key: self.api_key.is_some(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream_mode: self.stream_mode,
            yolo_mode: self.yolo_mode,
            theme: self.theme.clone(),
            namespace: self.namespace.clone(),
            offline_mode: self.offline_mode,
            allow_remote_mcp: self.allow_remote_mcp,
            allow_remote_embeddings: self.allow_remote_embeddings,
            forced_local: self.forced_local,
        }
    }
}

/// Redacted, display-oriented view of [`HackareConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub provider: String,
    pub base_url: String,
    pub has_api_key: bool,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub stream_mode: bool,
    pub yolo_mode: bool,
    pub theme: String,
    pub namespace: Option<String>,
    pub offline_mode: bool,
    pub allow_remote_mcp: bool,
    pub allow_remote_embeddings: bool,
    pub forced_local: bool,
}
