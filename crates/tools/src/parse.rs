//! Extracts a [`Function`] record from one Rhai source blob's docstring and
//! signature.
//!
//! Convention: the doc comment (`///`) block immediately above a `fn`
//! declaration carries the function's description plus `@param`/`@returns`
//! annotations. A parameter is optional when its annotation is suffixed with
//! `(optional)`. An `@internal` tag opts a function out of `toolSchemas()`;
//! everything else defaults to callable.
//!
//! ```text
//! /// Adds two numbers together.
//! /// @param a number the first addend
//! /// @param b number the second addend
//! /// @returns number the sum of a and b
//! fn add(a, b) {
//!     a + b
//! }
//! ```

use crate::{
    error::{Result, ToolError},
    function::{Function, ParamSpec, ParamType},
};

const PARAM_TAG: &str = "@param";
const RETURNS_TAG: &str = "@returns";
const INTERNAL_TAG: &str = "@internal";

pub fn parse(source_text: &str) -> Result<Function> {
    let lines: Vec<&str> = source_text.lines().collect();

    let fn_line_index =
        lines.iter().position(|line| line.trim_start().starts_with("fn ")).ok_or_else(|| ToolError::Parse("no `fn` declaration found".into()))?;

    let (name, param_names) = parse_signature(lines[fn_line_index])?;

    let doc_lines = collect_doc_block(&lines, fn_line_index);
    let (description, param_docs, return_description, callable) = parse_doc_block(&doc_lines);

    let params = param_names
        .into_iter()
        .map(|param_name| {
            param_docs.get(&param_name).cloned().unwrap_or_else(|| ParamSpec {
                name: param_name.clone(),
                param_type: ParamType::String,
                required: true,
                description: String::new(),
            })
        })
        .collect();

    Ok(Function { name, description, params, return_description, callable, source: source_text.to_string(), group: None })
}

fn parse_signature(line: &str) -> Result<(String, Vec<String>)> {
    let after_fn = line.trim_start().strip_prefix("fn ").ok_or_else(|| ToolError::Parse("malformed fn declaration".into()))?;
    let open = after_fn.find('(').ok_or_else(|| ToolError::Parse("missing `(` in fn declaration".into()))?;
    let close = after_fn.find(')').ok_or_else(|| ToolError::Parse("missing `)` in fn declaration".into()))?;

    let name = after_fn[..open].trim().to_string();
    if name.is_empty() {
        return Err(ToolError::Parse("function has no name".into()));
    }

    let params = after_fn[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.split_whitespace().next().unwrap_or(p).to_string())
        .collect();

    Ok((name, params))
}

fn collect_doc_block<'a>(lines: &[&'a str], fn_line_index: usize) -> Vec<&'a str> {
    let mut doc_lines = vec![];
    let mut index = fn_line_index;
    while index > 0 {
        index -= 1;
        let trimmed = lines[index].trim_start();
        if let Some(stripped) = trimmed.strip_prefix("///") {
            doc_lines.push(stripped.trim());
        } else {
            break;
        }
    }
    doc_lines.reverse();
    doc_lines
}

#[allow(clippy::type_complexity)]
fn parse_doc_block(doc_lines: &[&str]) -> (String, std::collections::HashMap<String, ParamSpec>, String, bool) {
    let mut description_lines = vec![];
    let mut param_docs = std::collections::HashMap::new();
    let mut return_description = String::new();
    let mut callable = true;

    for line in doc_lines {
        if let Some(rest) = line.strip_prefix(PARAM_TAG) {
            if let Some(spec) = parse_param_annotation(rest.trim()) {
                param_docs.insert(spec.name.clone(), spec);
            }
        } else if let Some(rest) = line.strip_prefix(RETURNS_TAG) {
            return_description = rest.trim().to_string();
        } else if line.trim() == INTERNAL_TAG {
            callable = false;
        } else {
            description_lines.push(*line);
        }
    }

    (description_lines.join(" ").trim().to_string(), param_docs, return_description, callable)
}

fn parse_param_annotation(rest: &str) -> Option<ParamSpec> {
    let mut parts = rest.splitn(3, char::is_whitespace);
    let name = parts.next()?.to_string();
    let type_token = parts.next().unwrap_or("string");
    let mut description = parts.next().unwrap_or("").trim().to_string();

    let required = if let Some(stripped) = description.strip_suffix("(optional)") {
        description = stripped.trim().to_string();
        false
    } else {
        true
    };

    Some(ParamSpec { name, param_type: ParamType::from_annotation(type_token), required, description })
}
