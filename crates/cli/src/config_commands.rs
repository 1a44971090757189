//! `config get/set/edit`: inspects or edits the project-local (or
//! user-global) config file that sits beneath the merge chain, per the
//! `HackareConfig` file layer in `hackare_config::file`.

use std::path::PathBuf;

use clap::Subcommand;
use hackare_config::HackareConfig;

use crate::error::{CliError, Result};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration, or one key from it.
    Get {
        /// A single field name (e.g. `model`, `theme`). Prints everything if omitted.
        key: Option<String>,
    },
    /// Write one key into the config file, creating it if none exists yet.
    Set { key: String, value: String },
    /// Open the config file in `$EDITOR` (falls back to `vi`).
    Edit,
}

pub fn get(cfg: &HackareConfig, key: Option<&str>) -> Result<()> {
    let snapshot = serde_json::to_value(cfg.snapshot()).unwrap_or(serde_json::Value::Null);
    match key {
        None => println!("{}", serde_json::to_string_pretty(&snapshot).unwrap_or_default()),
        Some(k) => match snapshot.get(k) {
            Some(value) => println!("{value}"),
            None => return Err(CliError::Usage(format!("unknown config key: {k}"))),
        },
    }
    Ok(())
}

/// The file a bare `set`/`edit` with no existing config file should create:
/// project-local, so a repo's `hackare.toml` stays with the repo it governs.
fn default_config_path() -> PathBuf {
    PathBuf::from("hackare.toml")
}

pub fn set(key: &str, raw_value: &str) -> Result<()> {
    if !is_known_key(key) {
        return Err(CliError::Usage(format!("unknown config key: {key}")));
    }

    let path = hackare_config::file::find_config_file().unwrap_or_else(default_config_path);
    let mut table: toml::Table = if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents).map_err(|e| CliError::Usage(format!("{}: {e}", path.display())))?
    } else {
        toml::Table::new()
    };

    table.insert(key.to_string(), parse_value(raw_value));

    let serialized = toml::to_string_pretty(&table).map_err(|e| CliError::Usage(e.to_string()))?;
    std::fs::write(&path, serialized)?;
    println!("Set {key} in {}.", path.display());
    Ok(())
}

pub fn edit() -> Result<()> {
    let path = hackare_config::file::find_config_file().unwrap_or_else(default_config_path);
    if !path.exists() {
        std::fs::write(&path, "")?;
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = std::process::Command::new(&editor).arg(&path).status()?;
    if !status.success() {
        return Err(CliError::Usage(format!("{editor} exited with {status}")));
    }
    Ok(())
}

fn is_known_key(key: &str) -> bool {
    const KNOWN: &[&str] = &[
        "provider",
        "base_url",
        "api_key",
        "model",
        "temperature",
        "max_tokens",
        "stream_mode",
        "yolo_mode",
        "system_prompt",
        "theme",
        "offline_mode",
        "allow_remote_mcp",
        "allow_remote_embeddings",
    ];
    KNOWN.contains(&key)
}

/// Parses a CLI-supplied value into the narrowest TOML type it looks like —
/// bool, integer, float, then string — so `set stream_mode false` round-trips
/// as a real boolean rather than the literal string `"false"`.
fn parse_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bool_int_float_and_string() {
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_value("42"), toml::Value::Integer(42));
        assert_eq!(parse_value("0.7"), toml::Value::Float(0.7));
        assert_eq!(parse_value("gpt-4o"), toml::Value::String("gpt-4o".to_string()));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(set("not_a_real_key", "x").is_err());
    }

    #[test]
    fn get_reports_an_unknown_key() {
        let cfg = HackareConfig::default();
        assert!(get(&cfg, Some("not_a_real_key")).is_err());
    }
}
