//! Tool registry: holds every registered [`Function`], dispatches
//! `execute()` calls into the sandboxed runtime, and emits OpenAI-style
//! tool schemas for callable functions.

use std::{collections::HashMap, sync::RwLock};

use crate::{
    builtin,
    error::Result,
    function::Function,
    runtime,
};

#[derive(Default)]
pub struct ToolRegistry {
    functions: RwLock<HashMap<String, Function>>,
    loaded_groups: RwLock<std::collections::HashSet<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically insert `function`, replacing any existing entry with the
    /// same name.
    pub fn add_or_replace(&self, function: Function) {
        self.functions.write().unwrap_or_else(|e| e.into_inner()).insert(function.name.clone(), function);
    }

    pub fn get(&self, name: &str) -> Option<Function> {
        self.functions.read().unwrap_or_else(|e| e.into_inner()).get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Function> {
        self.functions.write().unwrap_or_else(|e| e.into_inner()).remove(name)
    }

    /// Load a built-in group's functions into the registry, if not already
    /// loaded. A no-op for an unknown group name.
    pub fn load_group(&self, group: &str) {
        if self.loaded_groups.read().unwrap_or_else(|e| e.into_inner()).contains(group) {
            return;
        }
        let Some(functions) = builtin::functions_for_group(group) else { return };
        for function in functions {
            self.add_or_replace(function);
        }
        self.loaded_groups.write().unwrap_or_else(|e| e.into_inner()).insert(group.to_string());
    }

    /// Remove every function belonging to `group`, built-in or user-defined.
    pub fn remove_group(&self, group: &str) {
        self.functions.write().unwrap_or_else(|e| e.into_inner()).retain(|_, function| function.group.as_deref() != Some(group));
        self.loaded_groups.write().unwrap_or_else(|e| e.into_inner()).remove(group);
    }

    pub fn execute(&self, name: &str, arguments: &serde_json::Value) -> Result<serde_json::Value> {
        let function = self.get(name).ok_or_else(|| crate::error::ToolError::NotFound { name: name.to_string() })?;
        runtime::execute(&function, arguments)
    }

    /// OpenAI-style tool schemas for every callable (or explicitly
    /// tool-tagged) registered function.
    pub fn tool_schemas(&self) -> Vec<serde_json::Value> {
        self.functions.read().unwrap_or_else(|e| e.into_inner()).values().filter(|f| f.callable).map(Function::to_tool_schema).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn add_or_replace_substitutes_same_name_entry() {
        let registry = ToolRegistry::new();
        registry.add_or_replace(parse("/// v1\nfn f() { 1 }\n").unwrap());
        registry.add_or_replace(parse("/// v2\nfn f() { 2 }\n").unwrap());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.execute("f", &serde_json::json!({})).unwrap(), serde_json::json!(2_i64));
    }

    #[test]
    fn execute_unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.execute("missing", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, crate::error::ToolError::NotFound { .. }));
    }

    #[test]
    fn load_group_is_idempotent_and_populates_functions() {
        let registry = ToolRegistry::new();
        registry.load_group("text");
        registry.load_group("text");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn remove_group_drops_only_that_groups_functions() {
        let registry = ToolRegistry::new();
        registry.load_group("text");
        registry.load_group("math");
        registry.remove_group("text");
        assert!(registry.get("to_upper").is_none());
        assert!(registry.get("clamp_value").is_some());
    }

    #[test]
    fn tool_schemas_excludes_internal_functions() {
        let registry = ToolRegistry::new();
        registry.add_or_replace(parse("/// public\nfn pub_fn() { 1 }\n").unwrap());
        registry.add_or_replace(parse("/// hidden\n/// @internal\nfn hidden_fn() { 1 }\n").unwrap());
        let schemas = registry.tool_schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0]["function"]["name"], "pub_fn");
    }
}
