//! The [`Function`] metadata record and its JSON-Schema parameter type
//! mapping, per the tool registry's type table.

use serde::{Deserialize, Serialize};

/// A parameter's JSON Schema type, after mapping per the type table:
/// `string→String`, `number|int|integer|float|double→Number`,
/// `boolean|bool→Boolean`, `array→Array`, `object→Object`; anything else
/// falls back to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn from_annotation(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "number" | "int" | "integer" | "float" | "double" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::String,
        }
    }

    pub fn as_json_schema_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// One declared parameter of a [`Function`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

/// A parsed, registered function: source text plus the metadata extracted
/// from its docstring/annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub return_description: String,
    /// Whether the model may call this function as a tool. Functions not
    /// tagged `callable` or `tool` default to callable per the parser.
    pub callable: bool,
    /// The source blob this function was parsed from — used for
    /// group-scoped removal and for re-compiling at execution time.
    pub source: String,
    /// The built-in group this function belongs to, if any.
    pub group: Option<String>,
}

impl Function {
    /// Emit the OpenAI-style `{type:"function", function:{...}}` tool schema
    /// for this function.
    pub fn to_tool_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), serde_json::json!({"type": p.param_type.as_json_schema_str(), "description": p.description})))
            .collect();
        let required: Vec<&str> = self.params.iter().filter(|p| p.required).map(|p| p.name.as_str()).collect();

        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            },
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_type_maps_known_aliases() {
        assert_eq!(ParamType::from_annotation("integer"), ParamType::Number);
        assert_eq!(ParamType::from_annotation("Bool"), ParamType::Boolean);
        assert_eq!(ParamType::from_annotation("ARRAY"), ParamType::Array);
    }

    #[test]
    fn param_type_falls_back_to_string_for_unknown() {
        assert_eq!(ParamType::from_annotation("widget"), ParamType::String);
    }

    #[test]
    fn tool_schema_lists_only_required_params_as_required() {
        let function = Function {
            name: "search".into(),
            description: "Search the web".into(),
            params: vec![
                ParamSpec { name: "query".into(), param_type: ParamType::String, required: true, description: "query text".into() },
                ParamSpec { name: "limit".into(), param_type: ParamType::Number, required: false, description: "max results".into() },
            ],
            return_description: "a list of results".into(),
            callable: true,
            source: String::new(),
            group: None,
        };
        let schema = function.to_tool_schema();
        assert_eq!(schema["function"]["name"], "search");
        assert_eq!(schema["function"]["parameters"]["required"], serde_json::json!(["query"]));
        assert_eq!(schema["function"]["parameters"]["properties"]["limit"]["type"], "number");
    }
}
