//! Tool data model
//!
//! Requests, invocation specs, execution outcomes and results. Everything
//! here lives for exactly one tool call.

use crate::config::AdapterConfig;
use crate::errors::{AdapterError, Result};
use crate::tools::catalogue::KeyCatalogue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Named terminal size presets understood by cli-vision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizePreset {
    Compact,
    Standard,
    Large,
    Xl,
}

impl SizePreset {
    pub const ALL: [SizePreset; 4] = [
        SizePreset::Compact,
        SizePreset::Standard,
        SizePreset::Large,
        SizePreset::Xl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SizePreset::Compact => "compact",
            SizePreset::Standard => "standard",
            SizePreset::Large => "large",
            SizePreset::Xl => "xl",
        }
    }
}

/// Terminal size: a preset or an explicit `WIDTHxHEIGHT`.
///
/// An explicit size keeps the caller's literal; it is validated, never
/// rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerminalSize {
    Preset(SizePreset),
    Explicit(String),
}

impl Default for TerminalSize {
    fn default() -> Self {
        TerminalSize::Preset(SizePreset::Standard)
    }
}

impl TerminalSize {
    /// Token passed to `--size`
    pub fn token(&self) -> &str {
        match self {
            TerminalSize::Preset(preset) => preset.name(),
            TerminalSize::Explicit(literal) => literal,
        }
    }
}

impl FromStr for TerminalSize {
    type Err = AdapterError;

    /// Presets match case-insensitively. Explicit sizes must be exactly
    /// `<digits>x<digits>`, both positive, in the form cli-vision splits on.
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        if let Some(preset) = SizePreset::ALL.iter().find(|p| p.name() == lowered) {
            return Ok(TerminalSize::Preset(*preset));
        }

        let invalid = || {
            AdapterError::validation(format!(
                "invalid terminal size '{}'. Use: compact, standard, large, xl, or WIDTHxHEIGHT (e.g., 100x30)",
                s
            ))
        };

        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        let positive = |part: &str| {
            !part.is_empty()
                && part.bytes().all(|b| b.is_ascii_digit())
                && part.parse::<u16>().map(|v| v > 0).unwrap_or(false)
        };

        if positive(w) && positive(h) {
            Ok(TerminalSize::Explicit(s.to_string()))
        } else {
            Err(invalid())
        }
    }
}

/// A list parameter sent either comma-joined or as a JSON array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ListArg {
    Joined(String),
    Items(Vec<String>),
}

impl ListArg {
    /// Split on commas without touching the items. A blank joined string
    /// is no list at all.
    pub fn into_raw_items(self) -> Vec<String> {
        match self {
            ListArg::Joined(joined) if joined.trim().is_empty() => Vec::new(),
            ListArg::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            ListArg::Items(items) => items,
        }
    }

    /// Split into trimmed, non-empty items
    pub fn into_items(self) -> Vec<String> {
        self.into_raw_items()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Per-step prompts sent as an object or as a JSON-encoded string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StepPromptsArg {
    Encoded(String),
    Map(Map<String, Value>),
}

/// Wire arguments of `tui_test`
#[derive(Debug, Clone, Deserialize)]
pub struct RunSessionArgs {
    pub binary: String,
    #[serde(default)]
    pub inputs: Option<ListArg>,
    #[serde(default)]
    pub args: Option<ListArg>,
    #[serde(default)]
    pub delay_ms: Option<i64>,
    #[serde(default)]
    pub analyze: Option<bool>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub keep: Option<bool>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub step_prompts: Option<StepPromptsArg>,
}

/// Wire arguments of `tui_capture`
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureArgs {
    pub binary: String,
    #[serde(default)]
    pub args: Option<ListArg>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub keep: Option<bool>,
    #[serde(default)]
    pub size: Option<String>,
}

/// Validated multi-step session request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSessionRequest {
    pub binary: String,
    pub inputs: Vec<String>,
    pub args: Vec<String>,
    /// `None` means "use the configured default"
    pub delay_ms: Option<u64>,
    pub analyze: bool,
    pub output_dir: Option<PathBuf>,
    pub keep: bool,
    pub size: TerminalSize,
    pub prompt: Option<String>,
    pub step_prompts: BTreeMap<u32, String>,
}

/// Validated single-capture request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub binary: String,
    pub args: Vec<String>,
    pub output_path: Option<PathBuf>,
    pub keep: bool,
    pub size: TerminalSize,
}

/// One tool call, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    RunSession(RunSessionRequest),
    Capture(CaptureRequest),
    ListKeys,
}

impl ToolRequest {
    /// Capability that would be invoked, `None` for the static catalogue
    pub fn capability(&self) -> Option<Capability> {
        match self {
            ToolRequest::RunSession(_) => Some(Capability::Session),
            ToolRequest::Capture(_) => Some(Capability::Capture),
            ToolRequest::ListKeys => None,
        }
    }
}

/// The two process-backed capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Session,
    Capture,
}

impl Capability {
    /// cli-vision sub-command
    pub fn subcommand(&self) -> &'static str {
        match self {
            Capability::Session => "run",
            Capability::Capture => "cli",
        }
    }

    /// Prefix used in failure messages
    pub fn action(&self) -> &'static str {
        match self {
            Capability::Session => "Tool",
            Capability::Capture => "Capture",
        }
    }

    /// Session waits are delegated to cli-vision's own activity timeout;
    /// captures get a fixed ceiling.
    pub fn wait_policy(&self, config: &AdapterConfig) -> WaitPolicy {
        match self {
            Capability::Session => WaitPolicy::Delegated,
            Capability::Capture => WaitPolicy::Bounded(config.capture_timeout),
        }
    }
}

/// How long the invoker waits for the child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// No wall-clock limit
    Delegated,
    /// Kill the child after this long
    Bounded(Duration),
}

/// Fully-resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub capability: Capability,
    /// cli-vision executable
    pub program: PathBuf,
    /// Ordered tokens after the program
    pub args: Vec<String>,
    /// Application under test, resolved before spawning
    pub target: String,
}

impl InvocationSpec {
    /// Human-readable command line for logs
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push_str(&format!("{:?}", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Raw result of running the child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// `None` when killed by a signal or by the timeout
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub policy: WaitPolicy,
    /// Bounded policy and the ceiling was hit
    pub timed_out: bool,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// One captured state of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    /// 0 = initial state, before any input
    pub step: usize,
    #[serde(default)]
    pub input: Option<String>,
    pub screenshot_path: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Fields cli-vision emits that this layer does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of `tui_test`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub states: Vec<StepState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            states: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Result of `tui_capture`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub success: bool,
    pub error: Option<String>,
    pub screenshot_path: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl CaptureResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            screenshot_path: None,
            width: 0,
            height: 0,
        }
    }
}

/// What a tool call returns; exactly one variant per call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResult {
    Run(RunResult),
    Capture(CaptureResult),
    Keys(KeyCatalogue),
}

impl ToolResult {
    /// Failure in the shape of the given capability
    pub fn failure(capability: Capability, error: &AdapterError) -> Self {
        let message = error.to_string();
        match capability {
            Capability::Session => ToolResult::Run(RunResult::failure(message)),
            Capability::Capture => ToolResult::Capture(CaptureResult::failure(message)),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            ToolResult::Run(r) => r.success,
            ToolResult::Capture(r) => r.success,
            ToolResult::Keys(_) => true,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolResult::Run(r) => r.error.as_deref(),
            ToolResult::Capture(r) => r.error.as_deref(),
            ToolResult::Keys(_) => None,
        }
    }

    /// JSON form handed to the transport
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Parameter schema (JSON Schema)
    pub input_schema: Value,
}

impl ToolSchema {
    /// Create new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}
