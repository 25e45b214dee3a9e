//! Tool registry with JSON schemas
//!
//! Tools:
//! - tui_test: Drive a TUI through a key sequence, capturing each state
//! - tui_capture: Screenshot an application's initial state
//! - list_supported_keys: Key names accepted by tui_test

use crate::tools::types::ToolSchema;
use serde_json::json;

pub const TOOL_RUN_SESSION: &str = "tui_test";
pub const TOOL_CAPTURE: &str = "tui_capture";
pub const TOOL_LIST_KEYS: &str = "list_supported_keys";

const SIZE_DESCRIPTION: &str =
    "Terminal size: compact (80x24), standard (120x40), large (160x50), xl (200x60), or WIDTHxHEIGHT";

/// Tool registry
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// Schemas in registration order
    tools: Vec<ToolSchema>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create new tool registry with all tools
    pub fn new() -> Self {
        let mut registry = Self { tools: Vec::new() };

        registry.register_run_session();
        registry.register_capture();
        registry.register_list_keys();

        registry
    }

    /// Register tui_test tool
    fn register_run_session(&mut self) {
        let schema = ToolSchema::new(
            TOOL_RUN_SESSION,
            "Run a terminal application in a PTY, send it a sequence of key inputs and \
             capture a screenshot after each one. Step 0 is the initial state before any \
             input. With analyze=true each screenshot is described by a vision model. \
             Returns {success, error, states: [{step, input, screenshot_path, description}]}.",
            json!({
                "type": "object",
                "properties": {
                    "binary": {
                        "type": "string",
                        "description": "Path to the application under test (e.g. /usr/bin/htop, ./my-app)"
                    },
                    "inputs": {
                        "type": ["string", "array"],
                        "items": {"type": "string"},
                        "description": "Key inputs as a comma-separated string (e.g. \"down,down,enter,escape\") or an array. Items are trimmed. See list_supported_keys."
                    },
                    "args": {
                        "type": ["string", "array"],
                        "items": {"type": "string"},
                        "description": "Arguments for the application, comma-separated or an array. Items are trimmed and may not contain commas."
                    },
                    "delay_ms": {
                        "type": "integer",
                        "description": "Milliseconds to wait between inputs",
                        "default": 150,
                        "minimum": 0
                    },
                    "analyze": {
                        "type": "boolean",
                        "description": "Describe each screenshot with the vision model",
                        "default": true
                    },
                    "output_dir": {
                        "type": "string",
                        "description": "Directory for screenshots (default: a fresh session directory)"
                    },
                    "keep": {
                        "type": "boolean",
                        "description": "Keep screenshots after the run instead of cleaning up",
                        "default": false
                    },
                    "size": {
                        "type": "string",
                        "description": SIZE_DESCRIPTION,
                        "default": "standard"
                    },
                    "prompt": {
                        "type": "string",
                        "description": "Analysis prompt for every step; {step} and {input} are substituted"
                    },
                    "step_prompts": {
                        "type": ["string", "object"],
                        "additionalProperties": {"type": "string"},
                        "description": "Step number to prompt, as an object or its JSON text, e.g. {\"0\": \"Is there a blue button?\"}. Overrides prompt for those steps."
                    }
                },
                "required": ["binary"]
            }),
        );
        self.tools.push(schema);
    }

    /// Register tui_capture tool
    fn register_capture(&mut self) {
        let schema = ToolSchema::new(
            TOOL_CAPTURE,
            "Capture one screenshot of a terminal application's initial state without \
             sending input. Returns {success, error, screenshot_path, width, height}.",
            json!({
                "type": "object",
                "properties": {
                    "binary": {
                        "type": "string",
                        "description": "Path to the application to capture"
                    },
                    "args": {
                        "type": ["string", "array"],
                        "items": {"type": "string"},
                        "description": "Arguments passed after --, comma-separated or an array. Items are passed exactly as given."
                    },
                    "output_path": {
                        "type": "string",
                        "description": "Where to save the screenshot; its directory is used"
                    },
                    "keep": {
                        "type": "boolean",
                        "description": "Keep the screenshot after completion",
                        "default": false
                    },
                    "size": {
                        "type": "string",
                        "description": SIZE_DESCRIPTION,
                        "default": "standard"
                    }
                },
                "required": ["binary"]
            }),
        );
        self.tools.push(schema);
    }

    /// Register list_supported_keys tool
    fn register_list_keys(&mut self) {
        let schema = ToolSchema::new(
            TOOL_LIST_KEYS,
            "List the keyboard inputs accepted by tui_test, grouped by category.",
            json!({
                "type": "object",
                "properties": {}
            }),
        );
        self.tools.push(schema);
    }

    /// Get tool schema by name
    pub fn get(&self, name: &str) -> Option<&ToolSchema> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All schemas, in registration order
    pub fn schemas(&self) -> &[ToolSchema] {
        &self.tools
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// Get number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
