//! Holds user and default prompts and composes the effective system prompt.

use std::collections::HashSet;

use hackare_common::event_bus::{topic, EventBus};

use crate::prompt::{default_catalog, Prompt};

pub struct PromptLibrary {
    user_prompts: Vec<Prompt>,
    default_prompts: Vec<Prompt>,
    selected: HashSet<String>,
    events: EventBus,
    last_composed: Option<String>,
}

impl PromptLibrary {
    pub fn new(events: EventBus) -> Self {
        Self { user_prompts: vec![], default_prompts: default_catalog(), selected: HashSet::new(), events, last_composed: None }
    }

    pub fn add_user_prompt(&mut self, prompt: Prompt) {
        self.user_prompts.retain(|p| p.id != prompt.id);
        self.user_prompts.push(prompt);
    }

    pub fn remove_user_prompt(&mut self, id: &str) {
        self.user_prompts.retain(|p| p.id != id);
        self.selected.remove(id);
    }

    pub fn select(&mut self, id: &str) {
        self.selected.insert(id.to_string());
    }

    pub fn deselect(&mut self, id: &str) {
        self.selected.remove(id);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn user_prompts(&self) -> &[Prompt] {
        &self.user_prompts
    }

    pub fn default_prompts(&self) -> &[Prompt] {
        &self.default_prompts
    }

    /// The ordered concatenation of every selected prompt's content — user
    /// prompts first, then default prompts, each in catalog order — joined
    /// by `"\n\n"`, plus an auto-appended functions-library prompt
    /// enumerating `enabled_tools`.
    pub fn effective_system_prompt(&self, enabled_tools: &[(String, String)]) -> String {
        let mut sections: Vec<&str> = self
            .user_prompts
            .iter()
            .chain(self.default_prompts.iter())
            .filter(|p| self.selected.contains(&p.id))
            .map(|p| p.content.as_str())
            .collect();

        let functions_prompt = (!enabled_tools.is_empty()).then(|| functions_library_prompt(enabled_tools));
        if let Some(functions_prompt) = &functions_prompt {
            sections.push(functions_prompt.as_str());
        }

        sections.join("\n\n")
    }

    /// Recompute the composed prompt for `enabled_tools` and publish
    /// `systemPromptUpdated` if it changed since the last call.
    pub fn recompute(&mut self, enabled_tools: &[(String, String)]) -> String {
        let composed = self.effective_system_prompt(enabled_tools);
        if self.last_composed.as_deref() != Some(composed.as_str()) {
            self.events.publish(topic::SYSTEM_PROMPT_UPDATED, serde_json::json!({"systemPrompt": composed}));
            self.last_composed = Some(composed.clone());
        }
        composed
    }
}

fn functions_library_prompt(enabled_tools: &[(String, String)]) -> String {
    let mut text = String::from("Available functions:\n");
    for (name, description) in enabled_tools {
        text.push_str(&format!("- {name}: {description}\n"));
    }
    text.trim_end().to_string()
}
