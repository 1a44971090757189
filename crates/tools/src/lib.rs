//! Tool registry and sandboxed Rhai scripting runtime: parses function
//! docstrings into metadata, executes calls in a host-I/O-free engine under
//! a wall-clock budget, and emits OpenAI-style tool schemas.

pub mod builtin;
pub mod error;
pub mod function;
pub mod openai_schema;
pub mod parse;
pub mod registry;
pub mod runtime;

pub use error::{Result, ToolError};
pub use function::{Function, ParamSpec, ParamType};
pub use parse::parse;
pub use registry::ToolRegistry;
