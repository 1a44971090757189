//! Static provider/model catalog.
//!
//! Loaded once at start; never mutated. Entries missing a context-window
//! figure fall back to [`DEFAULT_CONTEXT_WINDOW`], per the token-budget bar
//! this table feeds.

use serde::{Deserialize, Serialize};

/// Providers with a built-in catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Openai,
    Groq,
    Berget,
    Ollama,
    #[serde(rename = "lmstudio")]
    LmStudio,
    #[serde(rename = "localai")]
    LocalAi,
    Llamafile,
    #[serde(rename = "gpt4all")]
    Gpt4All,
    Custom,
}

impl Provider {
    pub const ALL: [Provider; 9] = [
        Self::Openai,
        Self::Groq,
        Self::Berget,
        Self::Ollama,
        Self::LmStudio,
        Self::LocalAi,
        Self::Llamafile,
        Self::Gpt4All,
        Self::Custom,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Groq => "groq",
            Self::Berget => "berget",
            Self::Ollama => "ollama",
            Self::LmStudio => "lmstudio",
            Self::LocalAi => "localai",
            Self::Llamafile => "llamafile",
            Self::Gpt4All => "gpt4all",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: String,
    pub provider: Provider,
    pub display_name: String,
    pub context_window: u32,
    pub max_output_tokens: u32,
    pub capabilities: Vec<String>,
    pub is_default: bool,
}

/// Context window used for a model with no catalog entry.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 4096;

const MODEL_ID_NAMESPACE_SEP: &str = "::";

/// Qualify a bare model id with its provider, e.g. `openai::gpt-4o-mini`.
/// A model id that already contains the separator is returned unchanged.
#[must_use]
pub fn namespaced_model_id(provider: Provider, model_id: &str) -> String {
    if model_id.contains(MODEL_ID_NAMESPACE_SEP) {
        return model_id.to_string();
    }
    format!("{provider}{MODEL_ID_NAMESPACE_SEP}{model_id}")
}

/// Strip a provider namespace prefix, if present.
#[must_use]
pub fn raw_model_id(model_id: &str) -> &str {
    model_id.rsplit_once(MODEL_ID_NAMESPACE_SEP).map(|(_, raw)| raw).unwrap_or(model_id)
}

fn catalog() -> &'static [ModelRecord] {
    static CATALOG: std::sync::OnceLock<Vec<ModelRecord>> = std::sync::OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

fn record(provider: Provider, id: &str, display_name: &str, context_window: u32, max_output_tokens: u32, capabilities: &[&str], is_default: bool) -> ModelRecord {
    ModelRecord {
        id: id.to_string(),
        provider,
        display_name: display_name.to_string(),
        context_window,
        max_output_tokens,
        capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
        is_default,
    }
}

fn build_catalog() -> Vec<ModelRecord> {
    use Provider::{Berget, Custom, Gpt4All, Groq, Llamafile, LmStudio, LocalAi, Ollama, Openai};
    vec![
        record(Openai, "gpt-4o", "GPT-4o", 128_000, 16_384, &["tools", "vision"], false),
        record(Openai, "gpt-4o-mini", "GPT-4o mini", 128_000, 16_384, &["tools", "vision"], true),
        record(Openai, "gpt-4.1", "GPT-4.1", 1_047_576, 32_768, &["tools", "vision"], false),
        record(Openai, "o3-mini", "o3-mini", 200_000, 100_000, &["tools", "reasoning"], false),
        record(Groq, "llama-3.3-70b-versatile", "Llama 3.3 70B Versatile", 131_072, 32_768, &["tools"], true),
        record(Groq, "llama-3.1-8b-instant", "Llama 3.1 8B Instant", 131_072, 8_192, &["tools"], false),
        record(Groq, "mixtral-8x7b-32768", "Mixtral 8x7B", 32_768, 32_768, &["tools"], false),
        record(Berget, "llama-3.1-8b", "Llama 3.1 8B (Berget)", 131_072, 8_192, &["tools"], true),
        record(Ollama, "llama3.2", "Llama 3.2 (Ollama)", 131_072, 4_096, &["tools"], true),
        record(Ollama, "qwen2.5", "Qwen 2.5 (Ollama)", 32_768, 4_096, &["tools"], false),
        record(LmStudio, "local-model", "LM Studio model", 8_192, 4_096, &[], true),
        record(LocalAi, "local-model", "LocalAI model", 8_192, 4_096, &["tools"], true),
        record(Llamafile, "local-model", "Llamafile model", 8_192, 4_096, &[], true),
        record(Gpt4All, "local-model", "GPT4All model", 4_096, 2_048, &[], true),
        record(Custom, "custom-model", "Custom endpoint", DEFAULT_CONTEXT_WINDOW, 4_096, &[], true),
    ]
}

/// Look up a model by its bare or namespaced id.
pub fn lookup(model_id: &str) -> Option<&'static ModelRecord> {
    let raw = raw_model_id(model_id);
    catalog().iter().find(|m| m.id == raw)
}

/// Every model registered for `provider`.
pub fn models_for(provider: Provider) -> Vec<&'static ModelRecord> {
    catalog().iter().filter(|m| m.provider == provider).collect()
}

/// The default model for `provider`, if the catalog has one.
pub fn default_model(provider: Provider) -> Option<&'static ModelRecord> {
    catalog().iter().find(|m| m.provider == provider && m.is_default)
}

/// The context window for `model_id`, falling back to
/// [`DEFAULT_CONTEXT_WINDOW`] when the model has no catalog entry.
pub fn context_window(model_id: &str) -> u32 {
    lookup(model_id).map_or(DEFAULT_CONTEXT_WINDOW, |m| m.context_window)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_model() {
        let record = lookup("gpt-4o-mini").unwrap();
        assert_eq!(record.provider, Provider::Openai);
        assert_eq!(record.context_window, 128_000);
    }

    #[test]
    fn lookup_accepts_namespaced_id() {
        let record = lookup("openai::gpt-4o-mini").unwrap();
        assert_eq!(record.id, "gpt-4o-mini");
    }

    #[test]
    fn unknown_model_falls_back_to_default_context_window() {
        assert_eq!(context_window("some-unheard-of-model"), DEFAULT_CONTEXT_WINDOW);
    }

    #[test]
    fn each_provider_has_exactly_one_default() {
        for provider in Provider::ALL {
            let defaults: Vec<_> = models_for(provider).into_iter().filter(|m| m.is_default).collect();
            assert_eq!(defaults.len(), 1, "provider {provider} should have exactly one default model");
        }
    }

    #[test]
    fn default_model_matches_the_flagged_entry() {
        let model = default_model(Provider::Openai).unwrap();
        assert!(model.is_default);
    }

    #[test]
    fn namespaced_model_id_round_trips() {
        let namespaced = namespaced_model_id(Provider::Groq, "llama-3.3-70b-versatile");
        assert_eq!(namespaced, "groq::llama-3.3-70b-versatile");
        assert_eq!(raw_model_id(&namespaced), "llama-3.3-70b-versatile");
    }

    #[test]
    fn namespaced_model_id_is_idempotent() {
        let already = "groq::llama-3.3-70b-versatile";
        assert_eq!(namespaced_model_id(Provider::Groq, already), already);
    }
}
