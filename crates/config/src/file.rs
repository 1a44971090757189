//! Project-local and user-global config file discovery, sitting beneath
//! environment variables in the merge chain (see [`crate::loader::build`]).
//!
//! Search order: `./hackare.{toml,yaml,yml,json}`, then
//! `~/.config/hacka.re/hackare.{toml,yaml,yml,json}`. A missing or malformed
//! file is not fatal — the merge falls back to whatever the lower layers
//! already produced.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{error::ConfigError, schema::HackareConfig};

const CONFIG_FILENAMES: &[&str] = &["hackare.toml", "hackare.yaml", "hackare.yml", "hackare.json"];

/// Every field optional: only keys actually present in the file participate
/// in the merge.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
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

pub fn apply_file_overrides(cfg: &mut HackareConfig, file: &PartialConfig) {
    if let Some(v) = &file.provider {
        cfg.provider = v.clone();
    }
    if let Some(v) = &file.base_url {
        cfg.base_url = v.clone();
    }
    if let Some(v) = &file.api_key {
        cfg.api_key = Some(v.clone());
    }
    if let Some(v) = &file.model {
        cfg.model = v.clone();
    }
    if let Some(v) = file.temperature {
        cfg.temperature = v;
    }
    if let Some(v) = file.max_tokens {
        cfg.max_tokens = Some(v);
    }
    if let Some(v) = file.stream_mode {
        cfg.stream_mode = v;
    }
    if let Some(v) = file.yolo_mode {
        cfg.yolo_mode = v;
    }
    if let Some(v) = &file.system_prompt {
        cfg.system_prompt = Some(v.clone());
    }
    if let Some(v) = &file.theme {
        cfg.theme = v.clone();
    }
    if let Some(v) = file.offline_mode {
        cfg.offline_mode = v;
    }
    if let Some(v) = file.allow_remote_mcp {
        cfg.allow_remote_mcp = v;
    }
    if let Some(v) = file.allow_remote_embeddings {
        cfg.allow_remote_embeddings = v;
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "hacka.re") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Read and parse a config file by its extension (`toml`, `yaml`/`yml`, or
/// `json`), with `${VAR}` environment substitution applied first.
pub fn load_config_file(path: &Path) -> Result<PartialConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let raw = crate::env_subst::substitute_env(&raw);

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => toml::from_str(&raw).map_err(|e| ConfigError::FileFormat(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| ConfigError::FileFormat(e.to_string())),
        "json" => serde_json::from_str(&raw).map_err(|e| ConfigError::FileFormat(e.to_string())),
        other => Err(ConfigError::FileFormat(format!("unsupported config format: .{other}"))),
    }
}

/// Discover and load the project-local or user-global config file. Returns
/// an empty [`PartialConfig`] if none is found or the one found is
/// malformed — this layer never aborts the merge chain.
pub fn discover_file_overrides() -> PartialConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found");
        return PartialConfig::default();
    };

    match load_config_file(&path) {
        Ok(partial) => {
            debug!(path = %path.display(), "loaded config file");
            partial
        },
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to load config file, ignoring");
            PartialConfig::default()
        },
    }
}
