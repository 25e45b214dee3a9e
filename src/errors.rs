//! Error types for cli-vision-mcp
//!
//! Every failure a tool call can hit is one variant here. At the tool
//! boundary all of them collapse into `success: false` plus the variant's
//! display string, so the wording below is what agents actually read.

use thiserror::Error;

/// Main error type for the adapter
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Bad caller input, detected before any process is launched
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// An executable could not be resolved or launched
    #[error("{what} not found at {path}{hint}")]
    NotFound {
        what: String,
        path: String,
        hint: String,
    },

    /// The child ran but reported failure
    #[error("{action} failed: {detail}")]
    NonZeroExit {
        action: String,
        code: Option<i32>,
        detail: String,
    },

    /// Bounded wait exceeded; `seconds` may be fractional
    #[error("{action} timed out ({seconds}s) - app may be waiting for input")]
    Timeout { action: String, seconds: f64 },

    /// Output did not match the expected encoding
    #[error("Failed to parse output: {reason}\nStdout: {raw}")]
    ParseFailure { reason: String, raw: String },

    /// Tool name not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

impl AdapterError {
    /// Shorthand for a validation failure
    pub fn validation(msg: impl Into<String>) -> Self {
        AdapterError::Validation(msg.into())
    }
}
