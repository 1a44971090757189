//! Built-in tool groups, loaded lazily on first request.
//!
//! Each group ships as a single Rhai source blob (so the functions can share
//! helpers and compile as one script) plus hand-written [`Function`] metadata
//! per callable — built-ins are never run through [`crate::parse`], since
//! their docstrings aren't meant to be machine-parsed.

use crate::function::{Function, ParamSpec, ParamType};

const TEXT_GROUP_SOURCE: &str = r#"
fn to_upper(text) { text.to_upper() }
fn to_lower(text) { text.to_lower() }
fn word_count(text) { text.split(" ").len() }
"#;

const MATH_GROUP_SOURCE: &str = r#"
fn clamp_value(value, min, max) {
    if value < min { min } else if value > max { max } else { value }
}

fn round_to(value, digits) {
    let mut factor = 1.0;
    for i in 0..digits {
        factor *= 10.0;
    }
    (value * factor).round() / factor
}
"#;

fn param(name: &str, param_type: ParamType, description: &str) -> ParamSpec {
    ParamSpec { name: name.to_string(), param_type, required: true, description: description.to_string() }
}

fn text_group() -> Vec<Function> {
    vec![
        Function {
            name: "to_upper".into(),
            description: "Converts text to upper case.".into(),
            params: vec![param("text", ParamType::String, "the text to convert")],
            return_description: "the upper-cased text".into(),
            callable: true,
            source: TEXT_GROUP_SOURCE.into(),
            group: Some("text".into()),
        },
        Function {
            name: "to_lower".into(),
            description: "Converts text to lower case.".into(),
            params: vec![param("text", ParamType::String, "the text to convert")],
            return_description: "the lower-cased text".into(),
            callable: true,
            source: TEXT_GROUP_SOURCE.into(),
            group: Some("text".into()),
        },
        Function {
            name: "word_count".into(),
            description: "Counts the whitespace-separated words in text.".into(),
            params: vec![param("text", ParamType::String, "the text to count")],
            return_description: "the number of words".into(),
            callable: true,
            source: TEXT_GROUP_SOURCE.into(),
            group: Some("text".into()),
        },
    ]
}

fn math_group() -> Vec<Function> {
    vec![
        Function {
            name: "clamp_value".into(),
            description: "Clamps a number to the given range.".into(),
            params: vec![
                param("value", ParamType::Number, "the number to clamp"),
                param("min", ParamType::Number, "the lower bound"),
                param("max", ParamType::Number, "the upper bound"),
            ],
            return_description: "the clamped value".into(),
            callable: true,
            source: MATH_GROUP_SOURCE.into(),
            group: Some("math".into()),
        },
        Function {
            name: "round_to".into(),
            description: "Rounds a number to the given number of decimal digits.".into(),
            params: vec![
                param("value", ParamType::Number, "the number to round"),
                param("digits", ParamType::Number, "the number of decimal digits to keep"),
            ],
            return_description: "the rounded value".into(),
            callable: true,
            source: MATH_GROUP_SOURCE.into(),
            group: Some("math".into()),
        },
    ]
}

/// The names of every built-in group, for discovery/listing purposes.
pub const GROUPS: &[&str] = &["text", "math"];

/// The hand-written [`Function`] records for a built-in group, or `None` if
/// `group` isn't a built-in.
pub fn functions_for_group(group: &str) -> Option<Vec<Function>> {
    match group {
        "text" => Some(text_group()),
        "math" => Some(math_group()),
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_group_has_at_least_two_functions() {
        for &group in GROUPS {
            let functions = functions_for_group(group).unwrap();
            assert!(functions.len() >= 2, "group {group} should have at least two functions");
        }
    }

    #[test]
    fn unknown_group_returns_none() {
        assert!(functions_for_group("nonexistent").is_none());
    }

    #[test]
    fn group_functions_share_one_source_blob_each() {
        let text_functions = functions_for_group("text").unwrap();
        let sources: std::collections::HashSet<_> = text_functions.iter().map(|f| &f.source).collect();
        assert_eq!(sources.len(), 1);
    }
}
