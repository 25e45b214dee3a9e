//! cli-vision-mcp
//!
//! Exposes cli-vision's terminal UI testing to AI agents as three MCP tools:
//! `tui_test` (drive an application through key inputs, screenshot each
//! step), `tui_capture` (screenshot the initial state) and
//! `list_supported_keys` (the key vocabulary).
//!
//! # Architecture
//!
//! - **tools**: Translator -> Invoker -> Parser pipeline behind `ToolRuntime`
//! - **server**: Line-delimited JSON-RPC over stdio
//! - **config / telemetry / doctor / cli**: Ambient plumbing for the binary

pub mod cli;
pub mod config;
pub mod doctor;
pub mod errors;
pub mod server;
pub mod telemetry;
pub mod tools;

// Re-export commonly used types
pub use config::AdapterConfig;
pub use errors::{AdapterError, Result};
pub use tools::ToolRuntime;
