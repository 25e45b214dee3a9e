//! Argument translator
//!
//! Turns a tool call's named parameters into a validated `ToolRequest`, and a
//! `ToolRequest` into the exact cli-vision command line. Every check happens
//! here, before anything is spawned.
//!
//! Session token order is fixed:
//!
//! ```text
//! run --binary B --inputs I --delay D --size S --json
//!     [--output DIR] [--keep] [--args A] [--analyze --vlm-endpoint URL]
//!     [--prompt P] [--step-prompts JSON]
//! ```
//!
//! Capture:
//!
//! ```text
//! cli --binary B --size S [--output DIR] [--keep] [-- ARG...]
//! ```

use crate::config::AdapterConfig;
use crate::errors::{AdapterError, Result};
use crate::tools::catalogue::KeyCatalogue;
use crate::tools::registry::{TOOL_CAPTURE, TOOL_LIST_KEYS, TOOL_RUN_SESSION};
use crate::tools::types::{
    Capability, CaptureArgs, CaptureRequest, InvocationSpec, ListArg, RunSessionArgs,
    RunSessionRequest, StepPromptsArg, TerminalSize, ToolRequest,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Build a validated request from a tool name and its JSON arguments
pub fn parse_request(tool: &str, args: &Value) -> Result<ToolRequest> {
    match tool {
        TOOL_RUN_SESSION => {
            let raw: RunSessionArgs = decode_args(args)?;
            Ok(ToolRequest::RunSession(run_session_request(raw)?))
        }
        TOOL_CAPTURE => {
            let raw: CaptureArgs = decode_args(args)?;
            Ok(ToolRequest::Capture(capture_request(raw)?))
        }
        TOOL_LIST_KEYS => Ok(ToolRequest::ListKeys),
        other => Err(AdapterError::UnknownTool(other.to_string())),
    }
}

fn decode_args<T: DeserializeOwned>(args: &Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args.clone()
    };
    serde_json::from_value(args).map_err(|e| AdapterError::validation(e.to_string()))
}

/// Validate `tui_test` arguments
pub fn run_session_request(raw: RunSessionArgs) -> Result<RunSessionRequest> {
    let binary = require_binary(&raw.binary)?;

    let delay_ms = match raw.delay_ms {
        Some(d) if d < 0 => {
            return Err(AdapterError::validation(format!(
                "delay_ms must be a non-negative integer, got {}",
                d
            )))
        }
        Some(d) => Some(d as u64),
        None => None,
    };

    let inputs = comma_free_items("inputs", raw.inputs)?;
    let catalogue = KeyCatalogue::supported();
    for token in &inputs {
        if token.chars().count() > 1
            && !token.to_ascii_lowercase().starts_with("alt+")
            && !catalogue.is_named_key(token)
        {
            debug!("input '{}' is not a named key, cli-vision will type it as text", token);
        }
    }

    Ok(RunSessionRequest {
        binary,
        inputs,
        args: comma_free_items("args", raw.args)?,
        delay_ms,
        analyze: raw.analyze.unwrap_or(true),
        output_dir: non_empty(raw.output_dir).map(PathBuf::from),
        keep: raw.keep.unwrap_or(false),
        size: parse_size(raw.size)?,
        prompt: non_empty(raw.prompt),
        step_prompts: parse_step_prompts(raw.step_prompts)?,
    })
}

/// Validate `tui_capture` arguments
pub fn capture_request(raw: CaptureArgs) -> Result<CaptureRequest> {
    Ok(CaptureRequest {
        binary: require_binary(&raw.binary)?,
        args: raw.args.map(ListArg::into_raw_items).unwrap_or_default(),
        output_path: non_empty(raw.output_path).map(PathBuf::from),
        keep: raw.keep.unwrap_or(false),
        size: parse_size(raw.size)?,
    })
}

/// Command line for a request; `None` for requests served without a process
pub fn translate(request: &ToolRequest, config: &AdapterConfig) -> Result<Option<InvocationSpec>> {
    let spec = match request {
        ToolRequest::RunSession(req) => session_spec(req, config)?,
        ToolRequest::Capture(req) => capture_spec(req, config),
        ToolRequest::ListKeys => return Ok(None),
    };
    debug!("translated {:?} call: {}", spec.capability, spec.command_line());
    Ok(Some(spec))
}

fn session_spec(req: &RunSessionRequest, config: &AdapterConfig) -> Result<InvocationSpec> {
    let delay = req.delay_ms.unwrap_or(config.default_delay_ms);

    let mut args = vec![
        Capability::Session.subcommand().to_string(),
        "--binary".to_string(),
        req.binary.clone(),
        "--inputs".to_string(),
        req.inputs.join(","),
        "--delay".to_string(),
        delay.to_string(),
        "--size".to_string(),
        req.size.token().to_string(),
        "--json".to_string(),
    ];

    if let Some(dir) = &req.output_dir {
        args.push("--output".to_string());
        args.push(dir.to_string_lossy().into_owned());
    }
    if req.keep {
        args.push("--keep".to_string());
    }
    if !req.args.is_empty() {
        args.push("--args".to_string());
        args.push(req.args.join(","));
    }
    if req.analyze {
        args.push("--analyze".to_string());
        args.push("--vlm-endpoint".to_string());
        args.push(config.vlm_endpoint.clone());
    }
    if let Some(prompt) = &req.prompt {
        args.push("--prompt".to_string());
        args.push(prompt.clone());
    }
    if !req.step_prompts.is_empty() {
        args.push("--step-prompts".to_string());
        args.push(serde_json::to_string(&req.step_prompts)?);
    }

    Ok(InvocationSpec {
        capability: Capability::Session,
        program: config.executable.clone(),
        args,
        target: req.binary.clone(),
    })
}

fn capture_spec(req: &CaptureRequest, config: &AdapterConfig) -> InvocationSpec {
    let mut args = vec![
        Capability::Capture.subcommand().to_string(),
        "--binary".to_string(),
        req.binary.clone(),
        "--size".to_string(),
        req.size.token().to_string(),
    ];

    // cli-vision names the file itself; only the directory is passed on
    if let Some(path) = &req.output_path {
        args.push("--output".to_string());
        args.push(output_parent(path).to_string_lossy().into_owned());
    }
    if req.keep {
        args.push("--keep".to_string());
    }
    if !req.args.is_empty() {
        args.push("--".to_string());
        args.extend(req.args.iter().cloned());
    }

    InvocationSpec {
        capability: Capability::Capture,
        program: config.executable.clone(),
        args,
        target: req.binary.clone(),
    }
}

/// Directory containing `path`; `.` for a bare file name
pub fn output_parent(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => path.to_path_buf(),
    }
}

fn require_binary(binary: &str) -> Result<String> {
    let binary = binary.trim();
    if binary.is_empty() {
        return Err(AdapterError::validation("binary must not be empty"));
    }
    Ok(binary.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_size(size: Option<String>) -> Result<TerminalSize> {
    match non_empty(size) {
        Some(size) => size.parse(),
        None => Ok(TerminalSize::default()),
    }
}

/// Session lists travel comma-joined, so an item may not contain a comma
fn comma_free_items(field: &str, list: Option<ListArg>) -> Result<Vec<String>> {
    let items = list.map(ListArg::into_items).unwrap_or_default();
    if let Some(bad) = items.iter().find(|item| item.contains(',')) {
        return Err(AdapterError::validation(format!(
            "{} item '{}' contains a comma, which cannot be passed through",
            field, bad
        )));
    }
    Ok(items)
}

fn parse_step_prompts(raw: Option<StepPromptsArg>) -> Result<BTreeMap<u32, String>> {
    let map = match raw {
        None => return Ok(BTreeMap::new()),
        Some(StepPromptsArg::Map(map)) => map,
        Some(StepPromptsArg::Encoded(text)) => {
            if text.trim().is_empty() {
                return Ok(BTreeMap::new());
            }
            serde_json::from_str::<Map<String, Value>>(&text).map_err(|e| {
                AdapterError::validation(format!(
                    "step_prompts must be a JSON object mapping step numbers to prompts: {}",
                    e
                ))
            })?
        }
    };

    let mut prompts = BTreeMap::new();
    for (key, value) in map {
        let step: u32 = key.trim().parse().map_err(|_| {
            AdapterError::validation(format!(
                "step_prompts key '{}' is not a step number",
                key
            ))
        })?;
        let prompt = value.as_str().ok_or_else(|| {
            AdapterError::validation(format!("step_prompts[{}] must be a string", key))
        })?;
        prompts.insert(step, prompt.to_string());
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;
    use serde_json::json;

    fn config() -> AdapterConfig {
        AdapterConfig::default()
            .with_executable("/opt/cli-vision")
            .with_vlm_endpoint("http://127.0.0.1:8080/v1/chat/completions")
    }

    fn tokens(tool: &str, args: Value) -> Vec<String> {
        let request = parse_request(tool, &args).unwrap();
        translate(&request, &config()).unwrap().unwrap().args
    }

    #[test]
    fn test_session_minimal_order() {
        let args = tokens(
            TOOL_RUN_SESSION,
            json!({"binary": "/bin/sh", "inputs": "enter,escape", "analyze": false}),
        );
        assert_eq!(
            args,
            vec![
                "run", "--binary", "/bin/sh", "--inputs", "enter,escape", "--delay", "150",
                "--size", "standard", "--json",
            ]
        );
    }

    #[test]
    fn test_session_full_order() {
        let args = tokens(
            TOOL_RUN_SESSION,
            json!({
                "binary": "/usr/bin/htop",
                "inputs": ["down", "down", "enter"],
                "args": "--headless,--config,foo.yaml",
                "delay_ms": 200,
                "output_dir": "/tmp/shots",
                "keep": true,
                "size": "100x30",
                "prompt": "Is {input} highlighted?",
                "step_prompts": "{\"10\": \"later\", \"2\": \"dialog?\"}"
            }),
        );
        assert_eq!(
            args,
            vec![
                "run",
                "--binary",
                "/usr/bin/htop",
                "--inputs",
                "down,down,enter",
                "--delay",
                "200",
                "--size",
                "100x30",
                "--json",
                "--output",
                "/tmp/shots",
                "--keep",
                "--args",
                "--headless,--config,foo.yaml",
                "--analyze",
                "--vlm-endpoint",
                "http://127.0.0.1:8080/v1/chat/completions",
                "--prompt",
                "Is {input} highlighted?",
                "--step-prompts",
                "{\"2\":\"dialog?\",\"10\":\"later\"}",
            ]
        );
    }

    #[test]
    fn test_session_uses_configured_delay() {
        let request = parse_request(TOOL_RUN_SESSION, &json!({"binary": "x", "inputs": "q"})).unwrap();
        let spec = translate(&request, &config().with_default_delay_ms(75))
            .unwrap()
            .unwrap();
        assert_eq!(spec.args[6], "75");
        assert_eq!(spec.program, PathBuf::from("/opt/cli-vision"));
        assert_eq!(spec.target, "x");
    }

    #[test]
    fn test_session_empty_optionals_are_absent() {
        let args = tokens(
            TOOL_RUN_SESSION,
            json!({"binary": "app", "inputs": "q", "analyze": false, "output_dir": "", "args": "", "prompt": " ", "step_prompts": ""}),
        );
        assert_eq!(args.len(), 10);
    }

    #[test]
    fn test_capture_order_and_separator() {
        let args = tokens(
            TOOL_CAPTURE,
            json!({
                "binary": "./my-app",
                "args": "--headless,-c,conf.toml",
                "output_path": "/tmp/out/shot.png",
                "keep": true,
                "size": "compact"
            }),
        );
        assert_eq!(
            args,
            vec![
                "cli", "--binary", "./my-app", "--size", "compact", "--output", "/tmp/out",
                "--keep", "--", "--headless", "-c", "conf.toml",
            ]
        );
    }

    #[test]
    fn test_capture_args_pass_through_verbatim() {
        let args = tokens(
            TOOL_CAPTURE,
            json!({"binary": "app", "args": "--title, two words ,,-v"}),
        );
        assert_eq!(&args[5..], &["--", "--title", " two words ", "", "-v"]);

        let args = tokens(TOOL_CAPTURE, json!({"binary": "app", "args": [" -c ", ""]}));
        assert_eq!(&args[5..], &["--", " -c ", ""]);
    }

    #[test]
    fn test_session_lists_are_trimmed() {
        let args = tokens(
            TOOL_RUN_SESSION,
            json!({"binary": "app", "inputs": " down , enter ,", "analyze": false}),
        );
        assert_eq!(args[4], "down,enter");
    }

    #[test]
    fn test_explicit_size_keeps_leading_zeros() {
        let args = tokens(TOOL_CAPTURE, json!({"binary": "app", "size": "080x24"}));
        assert_eq!(args[4], "080x24");

        let args = tokens(
            TOOL_RUN_SESSION,
            json!({"binary": "app", "size": "0120x040", "analyze": false}),
        );
        let at = args.iter().position(|a| a == "--size").unwrap();
        assert_eq!(args[at + 1], "0120x040");
    }

    #[test]
    fn test_capture_minimal() {
        let args = tokens(TOOL_CAPTURE, json!({"binary": "/usr/bin/true", "size": "compact"}));
        assert_eq!(args, vec!["cli", "--binary", "/usr/bin/true", "--size", "compact"]);
    }

    #[test]
    fn test_output_parent() {
        assert_eq!(output_parent(Path::new("/tmp/a/b.png")), PathBuf::from("/tmp/a"));
        assert_eq!(output_parent(Path::new("b.png")), PathBuf::from("."));
        assert_eq!(output_parent(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_list_keys_has_no_invocation() {
        let request = parse_request(TOOL_LIST_KEYS, &Value::Null).unwrap();
        assert_eq!(request, ToolRequest::ListKeys);
        assert!(translate(&request, &config()).unwrap().is_none());
    }

    #[test]
    fn test_validation_failures() {
        let cases = vec![
            (TOOL_RUN_SESSION, json!({"binary": "", "inputs": "q"})),
            (TOOL_RUN_SESSION, json!({"binary": "  ", "inputs": "q"})),
            (TOOL_RUN_SESSION, json!({"inputs": "q"})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "delay_ms": -1})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "delay_ms": 1.5})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "delay_ms": "fast"})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "size": "abcx"})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "size": "0x0"})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "step_prompts": "not json"})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "step_prompts": {"first": "p"}})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "step_prompts": {"1": 5}})),
            (TOOL_RUN_SESSION, json!({"binary": "x", "args": ["a,b"]})),
            (TOOL_CAPTURE, json!({"binary": ""})),
            (TOOL_CAPTURE, json!({"binary": "x", "size": "80x"})),
            (TOOL_CAPTURE, json!({"binary": "x", "size": " 100x30"})),
            (TOOL_CAPTURE, json!({"binary": "x", "size": "100X30"})),
        ];

        for (tool, args) in cases {
            let result = parse_request(tool, &args);
            assert!(
                matches!(result, Err(AdapterError::Validation(_))),
                "expected validation error for {} {}",
                tool,
                args
            );
        }
    }

    #[test]
    fn test_unknown_tool() {
        let result = parse_request("tui_explode", &json!({}));
        assert!(matches!(result, Err(AdapterError::UnknownTool(_))));
    }

    #[test]
    fn test_step_prompts_object_form() {
        let request = parse_request(
            TOOL_RUN_SESSION,
            &json!({"binary": "x", "step_prompts": {"0": "blue button?", "3": "dialog?"}}),
        )
        .unwrap();
        match request {
            ToolRequest::RunSession(req) => {
                assert_eq!(req.step_prompts.get(&0).unwrap(), "blue button?");
                assert_eq!(req.step_prompts.get(&3).unwrap(), "dialog?");
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[quickcheck]
    fn prop_explicit_size_passes_through(width: u16, height: u16) -> TestResult {
        if width == 0 || height == 0 {
            return TestResult::discard();
        }
        let literal = format!("0{}x{:03}", width, height);
        let args = tokens(TOOL_CAPTURE, json!({"binary": "app", "size": literal}));
        TestResult::from_bool(args[4] == literal)
    }

    #[quickcheck]
    fn prop_session_translation_is_deterministic(
        binary: String,
        inputs: Vec<String>,
        delay: u16,
        keep: bool,
        analyze: bool,
    ) -> TestResult {
        if binary.trim().is_empty() || inputs.iter().any(|i| i.contains(',')) {
            return TestResult::discard();
        }
        let args = json!({
            "binary": binary,
            "inputs": inputs,
            "delay_ms": delay,
            "keep": keep,
            "analyze": analyze,
        });
        let first = tokens(TOOL_RUN_SESSION, args.clone());
        let second = tokens(TOOL_RUN_SESSION, args);
        TestResult::from_bool(first == second && first[0] == "run" && first[9] == "--json")
    }
}
