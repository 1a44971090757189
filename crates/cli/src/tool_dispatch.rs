//! Bridges the synchronous [`hackare_tools::ToolRegistry`] and the chat
//! engine's async [`hackare_chat::ToolDispatcher`]/[`hackare_chat::ConfirmPrompt`]
//! traits, and prompts for tool-call approval on stdin when `yoloMode` is off.

use std::{io::Write, sync::Arc};

use hackare_chat::{ConfirmPrompt, ToolDispatcher};
use hackare_tools::ToolRegistry;

/// Dispatches tool calls to a shared [`ToolRegistry`] from the async chat
/// engine, off-loading the registry's synchronous execution onto a blocking
/// thread so it never stalls the tokio runtime.
pub struct RegistryDispatcher {
    registry: Arc<ToolRegistry>,
}

impl RegistryDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait::async_trait]
impl ToolDispatcher for RegistryDispatcher {
    async fn call(&self, name: &str, arguments_json: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let registry = self.registry.clone();
        let name_owned = name.to_string();
        let arguments: serde_json::Value = serde_json::from_str(arguments_json)?;

        let outcome = tokio::task::spawn_blocking(move || registry.execute(&name_owned, &arguments)).await?;
        Ok(match outcome {
            Ok(value) => value.to_string(),
            Err(error) => {
                let message = match &error {
                    hackare_tools::ToolError::Timeout { .. } => "timeout".to_string(),
                    other => other.to_string(),
                };
                serde_json::json!({ "success": false, "error": message }).to_string()
            },
        })
    }

    fn tool_schemas(&self) -> Vec<serde_json::Value> {
        self.registry.tool_schemas()
    }
}

/// Prompts the user on stdin/stdout for approval of a pending tool call.
/// Only ever invoked by the chat engine when `yoloMode` is off.
pub struct StdinConfirm;

#[async_trait::async_trait]
impl ConfirmPrompt for StdinConfirm {
    async fn confirm(&self, tool_name: &str, arguments_json: &str) -> bool {
        let tool_name = tool_name.to_string();
        let arguments_json = arguments_json.to_string();

        tokio::task::spawn_blocking(move || {
            print!("Allow tool call `{tool_name}({arguments_json})`? [y/N] ");
            let _ = std::io::stdout().flush();

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}
