//! A single library entry: either user-authored or one of the curated
//! defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub content: String,
}

impl Prompt {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), content: content.into() }
    }
}

/// The curated default prompts, in catalog order.
pub fn default_catalog() -> Vec<Prompt> {
    vec![
        Prompt::new("default.concise", "Be concise", "Answer concisely. Prefer short, direct responses over padded prose."),
        Prompt::new(
            "default.markdown",
            "Markdown formatting",
            "Format responses in Markdown. Use fenced code blocks for code and tables for tabular data.",
        ),
        Prompt::new(
            "default.cite-uncertainty",
            "Flag uncertainty",
            "When unsure of a fact, say so explicitly rather than presenting a guess as established.",
        ),
    ]
}
