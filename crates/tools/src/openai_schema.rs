//! Converts [`Function::to_tool_schema`] output into the stricter shapes
//! different OpenAI-compatible endpoints expect.

use serde::Serialize;

/// Chat Completions API tool format (nested under "function").
#[derive(Debug, Serialize)]
pub struct ChatCompletionsTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: ChatCompletionsFunction,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionsFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
    pub strict: bool,
}

/// Responses API tool format (flat, name at top level).
#[derive(Debug, Serialize)]
pub struct ResponsesApiTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
    pub strict: bool,
}

/// Recursively patch a JSON Schema for OpenAI strict-mode compliance:
/// `additionalProperties: false` on every object, and every property listed
/// in `required`.
pub fn patch_schema_for_strict_mode(schema: &mut serde_json::Value) {
    let Some(obj) = schema.as_object_mut() else { return };

    if obj.get("type").and_then(|t| t.as_str()) == Some("object") {
        obj.insert("additionalProperties".to_string(), serde_json::json!(false));

        if let Some(props) = obj.get("properties").and_then(|p| p.as_object()) {
            let all_prop_names: Vec<serde_json::Value> = props.keys().map(|k| serde_json::json!(k)).collect();
            obj.insert("required".to_string(), serde_json::json!(all_prop_names));
        } else {
            obj.insert("properties".to_string(), serde_json::json!({}));
            obj.insert("required".to_string(), serde_json::json!([]));
        }
    }

    if let Some(props) = obj.get_mut("properties").and_then(|p| p.as_object_mut()) {
        for prop_schema in props.values_mut() {
            patch_schema_for_strict_mode(prop_schema);
        }
    }

    if let Some(items) = obj.get_mut("items") {
        patch_schema_for_strict_mode(items);
    }

    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(variants) = obj.get_mut(key).and_then(|v| v.as_array_mut()) {
            for variant in variants {
                patch_schema_for_strict_mode(variant);
            }
        }
    }

    if let Some(additional) = obj.get_mut("additionalProperties") {
        if additional.is_object() {
            patch_schema_for_strict_mode(additional);
        }
    }
}

fn extract_name_description(tool: &serde_json::Value) -> Option<(String, String)> {
    let name = tool["name"].as_str()?.to_string();
    let description = tool["description"].as_str().unwrap_or("").to_string();
    Some((name, description))
}

/// Convert `{type:"function", function:{name,description,parameters}}`
/// schemas into the nested Chat Completions function-calling format, with
/// `strict: true` and strict-mode-patched parameters.
pub fn to_openai_tools(tools: &[serde_json::Value]) -> Vec<serde_json::Value> {
    tools
        .iter()
        .filter_map(|t| {
            let source = if t.get("function").is_some() { &t["function"] } else { t };
            let (name, description) = extract_name_description(source)?;
            let mut params = source["parameters"].clone();
            patch_schema_for_strict_mode(&mut params);

            let tool = ChatCompletionsTool { tool_type: "function", function: ChatCompletionsFunction { name, description, parameters: params, strict: true } };
            serde_json::to_value(tool).ok()
        })
        .collect()
}

/// Convert tool schemas into the flat Responses API format (name at the
/// top level, no `function` wrapper).
pub fn to_responses_api_tools(tools: &[serde_json::Value]) -> Vec<serde_json::Value> {
    tools
        .iter()
        .filter_map(|t| {
            let source = if t.get("function").is_some() { &t["function"] } else { t };
            let (name, description) = extract_name_description(source)?;
            let mut params = source["parameters"].clone();
            patch_schema_for_strict_mode(&mut params);

            let tool = ResponsesApiTool { tool_type: "function", name, description, parameters: params, strict: true };
            serde_json::to_value(tool).ok()
        })
        .collect()
}
