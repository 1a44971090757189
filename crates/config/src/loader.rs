//! Layered configuration merge and the live `ConfigManager`.
//!
//! Merge order (lower entries override higher): built-in defaults →
//! persisted namespaced store → config file (project-local, then
//! user-global) → environment variables (`HACKARE_*`) → share-link payload
//! → CLI flags. `offlineMode` set on the CLI is the one exception: it wins
//! unconditionally, forcing `baseUrl` to a localhost default and blanking
//! any non-local provider's API key.

use hackare_egress::EgressPolicy;
use hackare_share::SharePayload;
use hackare_store::NamespacedStore;
use tracing::{debug, warn};

use crate::{
    error::ConfigError,
    schema::{HackareConfig, OFFLINE_BASE_URL},
};

/// CLI-flag overrides. Every field is `None` unless the user passed the
/// corresponding flag, so only flags actually given participate in the
/// merge.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stream_mode: Option<bool>,
    pub yolo_mode: Option<bool>,
    pub system_prompt: Option<String>,
    pub theme: Option<String>,
    pub offline_mode: Option<bool>,
    pub allow_remote_mcp: Option<bool>,
    pub allow_remote_embeddings: Option<bool>,
}

const STORE_KEYS: &[&str] = &[
    "provider",
    "baseUrl",
    "apiKey",
    "model",
    "temperature",
    "maxTokens",
    "streamMode",
    "yoloMode",
    "systemPrompt",
    "theme",
    "offlineMode",
    "allowRemoteMcp",
    "allowRemoteEmbeddings",
];

/// Apply `HACKARE_*` environment variables onto `cfg`, in place.
pub fn apply_env_overrides(cfg: &mut HackareConfig) {
    if let Ok(v) = std::env::var("HACKARE_PROVIDER") {
        cfg.provider = v;
    }
    if let Ok(v) = std::env::var("HACKARE_BASE_URL") {
        cfg.base_url = v;
    }
    if let Ok(v) = std::env::var("HACKARE_API_KEY") {
        cfg.api_key = Some(v);
    }
    if let Ok(v) = std::env::var("HACKARE_MODEL") {
        cfg.model = v;
    }
    if let Ok(v) = std::env::var("HACKARE_TEMPERATURE") {
        if let Ok(parsed) = v.parse() {
            cfg.temperature = parsed;
        }
    }
    if let Ok(v) = std::env::var("HACKARE_MAX_TOKENS") {
        cfg.max_tokens = v.parse().ok();
    }
    if let Ok(v) = std::env::var("HACKARE_STREAM_MODE") {
        if let Some(parsed) = parse_bool(&v) {
            cfg.stream_mode = parsed;
        }
    }
    if let Ok(v) = std::env::var("HACKARE_YOLO_MODE") {
        if let Some(parsed) = parse_bool(&v) {
            cfg.yolo_mode = parsed;
        }
    }
    if let Ok(v) = std::env::var("HACKARE_SYSTEM_PROMPT") {
        cfg.system_prompt = Some(v);
    }
    if let Ok(v) = std::env::var("HACKARE_THEME") {
        cfg.theme = v;
    }
    if let Ok(v) = std::env::var("HACKARE_OFFLINE") {
        if let Some(parsed) = parse_bool(&v) {
            cfg.offline_mode = parsed;
        }
    }
    if let Ok(v) = std::env::var("HACKARE_ALLOW_REMOTE_MCP") {
        if let Some(parsed) = parse_bool(&v) {
            cfg.allow_remote_mcp = parsed;
        }
    }
    if let Ok(v) = std::env::var("HACKARE_ALLOW_REMOTE_EMBEDDINGS") {
        if let Some(parsed) = parse_bool(&v) {
            cfg.allow_remote_embeddings = parsed;
        }
    }
}

/// Apply the subset of fields a decrypted share payload carries. Per spec
/// §4.3: the payload is still applied even when its provider/baseUrl is one
/// the egress policy forbids, but in that case the transport fields are
/// overridden to the localhost default and `forcedLocal` is set, rather than
/// the merge silently keeping a URL that later calls would be denied for.
pub fn apply_share_payload(cfg: &mut HackareConfig, payload: &SharePayload) {
    if let Some(v) = &payload.api_key {
        cfg.api_key = Some(v.clone());
    }
    if let Some(v) = &payload.base_url {
        cfg.base_url = v.clone();
    }
    if let Some(v) = &payload.base_url_provider {
        cfg.provider = v.clone();
    }
    if let Some(v) = &payload.model {
        cfg.model = v.clone();
    }
    if let Some(v) = &payload.system_prompt {
        cfg.system_prompt = Some(v.clone());
    }
    if let Some(v) = &payload.theme {
        cfg.theme = v.clone();
    }

    let policy = EgressPolicy { offline_mode: cfg.offline_mode, allow_remote_mcp: cfg.allow_remote_mcp, allow_remote_embeddings: cfg.allow_remote_embeddings };
    let classification = hackare_egress::classify(&cfg.base_url);
    if hackare_egress::permit(&cfg.base_url, classification, policy).is_err() {
        warn!(base_url = %cfg.base_url, provider = %cfg.provider, "share payload's provider forbidden by egress policy, forcing local");
        cfg.base_url = OFFLINE_BASE_URL.to_string();
        if !is_local_provider(&cfg.provider) {
            cfg.api_key = None;
        }
        cfg.forced_local = true;
    }
}

/// Apply CLI flag overrides, last in the merge order, with the `offlineMode`
/// exception applied after everything else.
pub fn apply_cli_overrides(cfg: &mut HackareConfig, cli: &CliOverrides) {
    if let Some(v) = &cli.provider {
        cfg.provider = v.clone();
    }
    if let Some(v) = &cli.base_url {
        cfg.base_url = v.clone();
    }
    if let Some(v) = &cli.api_key {
        cfg.api_key = Some(v.clone());
    }
    if let Some(v) = &cli.model {
        cfg.model = v.clone();
    }
    if let Some(v) = cli.temperature {
        cfg.temperature = v;
    }
    if let Some(v) = cli.max_tokens {
        cfg.max_tokens = Some(v);
    }
    if let Some(v) = cli.stream_mode {
        cfg.stream_mode = v;
    }
    if let Some(v) = cli.yolo_mode {
        cfg.yolo_mode = v;
    }
    if let Some(v) = &cli.system_prompt {
        cfg.system_prompt = Some(v.clone());
    }
    if let Some(v) = &cli.theme {
        cfg.theme = v.clone();
    }
    if let Some(v) = cli.allow_remote_mcp {
        cfg.allow_remote_mcp = v;
    }
    if let Some(v) = cli.allow_remote_embeddings {
        cfg.allow_remote_embeddings = v;
    }

    if let Some(true) = cli.offline_mode {
        cfg.offline_mode = true;
        cfg.base_url = OFFLINE_BASE_URL.to_string();
        if !is_local_provider(&cfg.provider) {
            cfg.api_key = None;
        }
    } else if let Some(false) = cli.offline_mode {
        cfg.offline_mode = false;
    }
}

fn is_local_provider(provider: &str) -> bool {
    matches!(provider, "ollama" | "local" | "llamafile" | "lmstudio")
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read every known config key from the namespaced store onto `cfg`,
/// leaving fields untouched when the store has no value for them.
pub async fn apply_store_overrides(cfg: &mut HackareConfig, store: &NamespacedStore) -> Result<(), ConfigError> {
    for key in STORE_KEYS {
        let Some(value) = store.get(key).await? else { continue };
        apply_stored_field(cfg, key, value);
    }
    Ok(())
}

fn apply_stored_field(cfg: &mut HackareConfig, key: &str, value: serde_json::Value) {
    match key {
        "provider" => {
            if let Some(s) = value.as_str() {
                cfg.provider = s.to_string();
            }
        },
        "baseUrl" => {
            if let Some(s) = value.as_str() {
                cfg.base_url = s.to_string();
            }
        },
        "apiKey" => {
            if let Some(s) = value.as_str() {
                cfg.api_key = Some(s.to_string());
            }
        },
        "model" => {
            if let Some(s) = value.as_str() {
                cfg.model = s.to_string();
            }
        },
        "temperature" => {
            if let Some(f) = value.as_f64() {
                cfg.temperature = f;
            }
        },
        "maxTokens" => {
            cfg.max_tokens = value.as_u64().map(|n| n as u32);
        },
        "streamMode" => {
            if let Some(b) = value.as_bool() {
                cfg.stream_mode = b;
            }
        },
        "yoloMode" => {
            if let Some(b) = value.as_bool() {
                cfg.yolo_mode = b;
            }
        },
        "systemPrompt" => {
            if let Some(s) = value.as_str() {
                cfg.system_prompt = Some(s.to_string());
            }
        },
        "theme" => {
            if let Some(s) = value.as_str() {
                cfg.theme = s.to_string();
            }
        },
        "offlineMode" => {
            if let Some(b) = value.as_bool() {
                cfg.offline_mode = b;
            }
        },
        "allowRemoteMcp" => {
            if let Some(b) = value.as_bool() {
                cfg.allow_remote_mcp = b;
            }
        },
        "allowRemoteEmbeddings" => {
            if let Some(b) = value.as_bool() {
                cfg.allow_remote_embeddings = b;
            }
        },
        other => debug!(key = other, "ignoring unrecognized stored config key"),
    }
}

/// Persist every field in `cfg` back to the namespaced store, under its
/// `HACKARE_*`-style JSON key.
pub async fn persist(cfg: &HackareConfig, store: &NamespacedStore) -> Result<(), ConfigError> {
    store.set("provider", &serde_json::json!(cfg.provider)).await?;
    store.set("baseUrl", &serde_json::json!(cfg.base_url)).await?;
    if let Some(api_key) = &cfg.api_key {
        store.set("apiKey", &serde_json::json!(api_key)).await?;
    }
    store.set("model", &serde_json::json!(cfg.model)).await?;
    store.set("temperature", &serde_json::json!(cfg.temperature)).await?;
    store.set("maxTokens", &serde_json::json!(cfg.max_tokens)).await?;
    store.set("streamMode", &serde_json::json!(cfg.stream_mode)).await?;
    store.set("yoloMode", &serde_json::json!(cfg.yolo_mode)).await?;
    if let Some(prompt) = &cfg.system_prompt {
        store.set("systemPrompt", &serde_json::json!(prompt)).await?;
    }
    store.set("theme", &serde_json::json!(cfg.theme)).await?;
    store.set("offlineMode", &serde_json::json!(cfg.offline_mode)).await?;
    store.set("allowRemoteMcp", &serde_json::json!(cfg.allow_remote_mcp)).await?;
    store
        .set("allowRemoteEmbeddings", &serde_json::json!(cfg.allow_remote_embeddings))
        .await?;
    Ok(())
}

/// Build the effective configuration by running the full merge chain.
pub async fn build(
    store: &NamespacedStore,
    share_payload: Option<&SharePayload>,
    cli: &CliOverrides,
) -> Result<HackareConfig, ConfigError> {
    let mut cfg = HackareConfig::default();
    apply_store_overrides(&mut cfg, store).await?;
    crate::file::apply_file_overrides(&mut cfg, &crate::file::discover_file_overrides());
    apply_env_overrides(&mut cfg);
    if let Some(payload) = share_payload {
        apply_share_payload(&mut cfg, payload);
    }
    apply_cli_overrides(&mut cfg, cli);
    Ok(cfg)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use hackare_common::event_bus::EventBus;
    use tempfile::tempdir;

    use super::*;

    async fn store() -> (tempfile::TempDir, NamespacedStore) {
        let dir = tempdir().unwrap();
        let store = NamespacedStore::new(dir.path().to_path_buf(), EventBus::default());
        store.set_namespace("test-ns".to_string());
        (dir, store)
    }

    #[tokio::test]
    async fn defaults_survive_with_no_overrides() {
        let (_dir, store) = store().await;
        let cfg = build(&store, None, &CliOverrides::default()).await.unwrap();
        assert_eq!(cfg, HackareConfig::default());
    }

    #[tokio::test]
    async fn store_overrides_defaults() {
        let (_dir, store) = store().await;
        store.set("model", &serde_json::json!("gpt-4o")).await.unwrap();
        let cfg = build(&store, None, &CliOverrides::default()).await.unwrap();
        assert_eq!(cfg.model, "gpt-4o");
    }

    #[tokio::test]
    async fn share_payload_overrides_store() {
        let (_dir, store) = store().await;
        store.set("model", &serde_json::json!("gpt-4o")).await.unwrap();
        let payload = SharePayload { model: Some("gpt-5".to_string()), ..Default::default() };
        let cfg = build(&store, Some(&payload), &CliOverrides::default()).await.unwrap();
        assert_eq!(cfg.model, "gpt-5");
    }

    #[tokio::test]
    async fn share_payload_naming_a_forbidden_remote_provider_is_forced_local() {
        let (_dir, store) = store().await;
        store.set("offlineMode", &serde_json::json!(true)).await.unwrap();
        let payload = SharePayload {
            base_url: Some("https://api.openai.com/v1".to_string()),
            base_url_provider: Some("openai".to_string()),
            api_key: Some("sk-remote".to_string()),
            ..Default::default()
        };
        let cfg = build(&store, Some(&payload), &CliOverrides::default()).await.unwrap();
        assert!(cfg.forced_local);
        assert_eq!(cfg.base_url, OFFLINE_BASE_URL);
        assert_eq!(cfg.api_key, None);
    }

    #[tokio::test]
    async fn share_payload_permitted_by_policy_is_not_forced_local() {
        let (_dir, store) = store().await;
        let payload = SharePayload {
            base_url: Some("https://api.openai.com/v1".to_string()),
            base_url_provider: Some("openai".to_string()),
            ..Default::default()
        };
        let cfg = build(&store, Some(&payload), &CliOverrides::default()).await.unwrap();
        assert!(!cfg.forced_local);
        assert_eq!(cfg.base_url, "https://api.openai.com/v1");
    }

    #[tokio::test]
    async fn cli_overrides_everything() {
        let (_dir, store) = store().await;
        store.set("model", &serde_json::json!("gpt-4o")).await.unwrap();
        let payload = SharePayload { model: Some("gpt-5".to_string()), ..Default::default() };
        let cli = CliOverrides { model: Some("gpt-6".to_string()), ..Default::default() };
        let cfg = build(&store, Some(&payload), &cli).await.unwrap();
        assert_eq!(cfg.model, "gpt-6");
    }

    #[tokio::test]
    async fn offline_mode_forces_localhost_and_blanks_remote_api_key() {
        let (_dir, store) = store().await;
        let cli = CliOverrides {
            provider: Some("openai".to_string()),
            api_key: Some("sk-remote".to_string()),
            offline_mode: Some(true),
            ..Default::default()
        };
        let cfg = build(&store, None, &cli).await.unwrap();
        assert!(cfg.offline_mode);
        assert_eq!(cfg.base_url, OFFLINE_BASE_URL);
        assert_eq!(cfg.api_key, None);
    }

    #[tokio::test]
    async fn offline_mode_keeps_api_key_for_local_providers() {
        let (_dir, store) = store().await;
        let cli = CliOverrides {
            provider: Some("ollama".to_string()),
            api_key: Some("unused".to_string()),
            offline_mode: Some(true),
            ..Default::default()
        };
        let cfg = build(&store, None, &cli).await.unwrap();
        assert_eq!(cfg.api_key, Some("unused".to_string()));
    }
}
