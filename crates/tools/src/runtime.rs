//! Executes a parsed [`Function`] in a fresh, sandboxed `rhai::Engine`.
//!
//! Every call gets its own engine and scope — no state survives between
//! calls. The engine never registers filesystem, network, or process
//! functions, so host I/O is unreachable by construction rather than
//! policed at runtime. A wall-clock budget is enforced through
//! `Engine::on_progress`, which Rhai polls between operations.

use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, Scope};
use tracing::warn;

use crate::{
    error::{Result, ToolError},
    function::Function,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

fn sandboxed_engine(timeout: Duration) -> Engine {
    let mut engine = Engine::new();
    engine.disable_symbol("eval");

    let start = Instant::now();
    engine.on_progress(move |_operations| if start.elapsed() > timeout { Some(Dynamic::from("timeout")) } else { None });

    engine
}

/// Run `function` with `arguments`, binding each declared parameter (in
/// declaration order) to the matching key in `arguments`. Missing optional
/// parameters bind to `()`; a missing required parameter is an error.
pub fn execute(function: &Function, arguments: &serde_json::Value) -> Result<serde_json::Value> {
    execute_with_timeout(function, arguments, DEFAULT_TIMEOUT)
}

pub fn execute_with_timeout(function: &Function, arguments: &serde_json::Value, timeout: Duration) -> Result<serde_json::Value> {
    let engine = sandboxed_engine(timeout);

    let ast = engine.compile(&function.source).map_err(|e| ToolError::Runtime { name: function.name.clone(), message: e.to_string() })?;

    let mut call_args: Vec<Dynamic> = Vec::with_capacity(function.params.len());
    for param in &function.params {
        let value = arguments.get(&param.name);
        match value {
            Some(v) => {
                let dynamic = rhai::serde::to_dynamic(v)
                    .map_err(|e| ToolError::InvalidArguments { name: function.name.clone(), message: e.to_string() })?;
                call_args.push(dynamic);
            },
            None if param.required => {
                return Err(ToolError::InvalidArguments {
                    name: function.name.clone(),
                    message: format!("missing required parameter `{}`", param.name),
                });
            },
            None => call_args.push(Dynamic::UNIT),
        }
    }

    let mut scope = Scope::new();
    let result = engine.call_fn::<Dynamic>(&mut scope, &ast, &function.name, call_args);

    match result {
        Ok(value) => rhai::serde::from_dynamic(&value).map_err(|e| ToolError::Runtime { name: function.name.clone(), message: e.to_string() }),
        Err(source) => {
            if matches!(*source, rhai::EvalAltResult::ErrorTerminated(..)) {
                return Err(ToolError::Timeout { name: function.name.clone() });
            }
            warn!(tool = %function.name, error = %source, "tool execution failed");
            Err(ToolError::Runtime { name: function.name.clone(), message: source.to_string() })
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn executes_and_coerces_result_to_json() {
        let source = "/// Adds two numbers.\n/// @param a number first\n/// @param b number second\nfn add(a, b) { a + b }\n";
        let function = parse(source).unwrap();
        let result = execute(&function, &serde_json::json!({"a": 2, "b": 3})).unwrap();
        assert_eq!(result, serde_json::json!(5_i64));
    }

    #[test]
    fn missing_required_argument_is_an_error() {
        let source = "/// Needs x.\n/// @param x number a number\nfn needs_x(x) { x }\n";
        let function = parse(source).unwrap();
        let err = execute(&function, &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn forbidden_host_io_is_unreachable() {
        // `eval` is disabled, and no file/network/process API is ever
        // registered on the sandboxed engine, so there's nothing for a
        // malicious script to call into.
        let source = "/// Tries to eval.\nfn sneaky() { eval(\"1 + 1\") }\n";
        let function = parse(source).unwrap();
        let err = execute(&function, &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolError::Runtime { .. }));
    }

    #[test]
    fn infinite_loop_times_out() {
        let source = "/// Never returns.\nfn spin() { loop {} }\n";
        let function = parse(source).unwrap();
        let err = execute_with_timeout(&function, &serde_json::json!({}), Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[test]
    fn string_arguments_round_trip() {
        let source = "/// Shouts a string.\n/// @param text string the text\nfn shout(text) { text + \"!\" }\n";
        let function = parse(source).unwrap();
        let result = execute(&function, &serde_json::json!({"text": "hi"})).unwrap();
        assert_eq!(result, serde_json::json!("hi!"));
    }
}
