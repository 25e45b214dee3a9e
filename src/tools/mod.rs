//! Tool pipeline
//!
//! Each call flows through three stages:
//! - Translator: tool arguments -> validated request -> cli-vision argv
//! - Invoker: argv -> child process -> exit status and output
//! - Parser: output -> structured result
//!
//! plus the registry of advertised schemas and the runtime that wires the
//! stages together.

pub mod types;
pub mod registry;
pub mod catalogue;
pub mod translator;
pub mod invoker;
pub mod parser;
pub mod runtime;

// Re-export commonly used types
pub use catalogue::KeyCatalogue;
pub use invoker::{ProcessInvoker, SubprocessInvoker};
pub use registry::ToolRegistry;
pub use runtime::ToolRuntime;
pub use types::{
    CaptureResult, InvocationSpec, RunResult, TerminalSize, ToolRequest, ToolResult, ToolSchema,
};
