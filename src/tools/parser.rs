//! Result parser
//!
//! The two cli-vision sub-commands report differently: `run --json` prints
//! one JSON object, `cli` prints human-oriented lines. Both are handled here
//! so nothing else depends on either format. Parsing never fails; every
//! problem becomes a `success: false` result.

use crate::errors::{AdapterError, Result};
use crate::tools::types::{
    Capability, CaptureResult, ExecutionOutcome, RunResult, ToolResult, WaitPolicy,
};
use tracing::warn;

/// Precedes `WIDTHxHEIGHT` in capture output
pub const SIZE_MARKER: &str = "Size:";

/// Precedes the screenshot path in capture output
pub const PATH_MARKER: &str = "Captured CLI screenshot:";

type Extractor = fn(&str, &mut CaptureResult);

/// (marker, extractor) pairs applied to capture output. The extractor gets
/// the text after the marker on the first line containing it.
const CAPTURE_FIELDS: &[(&str, Extractor)] = &[
    (SIZE_MARKER, extract_dimensions),
    (PATH_MARKER, extract_screenshot_path),
];

/// Turn a finished process into the capability's result
pub fn parse_outcome(capability: Capability, outcome: &ExecutionOutcome) -> ToolResult {
    let parsed = check_exit(capability, outcome).and_then(|()| match capability {
        Capability::Session => parse_session(&outcome.stdout).map(ToolResult::Run),
        Capability::Capture => Ok(ToolResult::Capture(parse_capture(&outcome.stdout))),
    });

    match parsed {
        Ok(result) => result,
        Err(e) => {
            warn!("{} call failed: {}", capability.subcommand(), e);
            ToolResult::failure(capability, &e)
        }
    }
}

/// Timeout and exit status, before any output is looked at
fn check_exit(capability: Capability, outcome: &ExecutionOutcome) -> Result<()> {
    if outcome.timed_out {
        let seconds = match outcome.policy {
            WaitPolicy::Bounded(limit) => limit.as_secs_f64(),
            WaitPolicy::Delegated => 0.0,
        };
        return Err(AdapterError::Timeout {
            action: capability.action().to_string(),
            seconds,
        });
    }

    if outcome.exit_code == Some(0) {
        return Ok(());
    }

    let stderr = outcome.stderr.trim();
    let detail = if !stderr.is_empty() {
        stderr.to_string()
    } else {
        match outcome.exit_code {
            Some(code) => format!("cli-vision exited with status {} and no error output", code),
            None => "cli-vision was terminated by a signal with no error output".to_string(),
        }
    };

    Err(AdapterError::NonZeroExit {
        action: capability.action().to_string(),
        code: outcome.exit_code,
        detail,
    })
}

/// Parse `run --json` output; the object is passed through as-is.
pub fn parse_session(stdout: &str) -> Result<RunResult> {
    let mut result: RunResult =
        serde_json::from_str(stdout.trim()).map_err(|e| AdapterError::ParseFailure {
            reason: e.to_string(),
            raw: stdout.to_string(),
        })?;

    // A failed run carries an error and no states
    if !result.success {
        let has_error = result
            .error
            .as_deref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false);
        if !has_error {
            result.error = Some("cli-vision reported failure without an error message".to_string());
        }
        result.states.clear();
    }

    Ok(result)
}

/// Scrape `cli` output. Missing markers leave fields at zero/absent.
pub fn parse_capture(stdout: &str) -> CaptureResult {
    let mut result = CaptureResult {
        success: true,
        error: None,
        screenshot_path: None,
        width: 0,
        height: 0,
    };
    let mut matched = [false; CAPTURE_FIELDS.len()];

    for line in stdout.lines() {
        for (idx, (marker, extract)) in CAPTURE_FIELDS.iter().enumerate() {
            if matched[idx] {
                continue;
            }
            if let Some(pos) = line.find(marker) {
                matched[idx] = true;
                extract(&line[pos + marker.len()..], &mut result);
            }
        }
    }

    result
}

/// `1920x1280 (terminal: 120x40)` -> 1920, 1280
fn extract_dimensions(rest: &str, result: &mut CaptureResult) {
    let Some(token) = rest.split_whitespace().next() else {
        return;
    };
    let Some((w, h)) = token.split_once('x') else {
        return;
    };
    if let (Ok(width), Ok(height)) = (w.parse::<u32>(), h.parse::<u32>()) {
        result.width = width;
        result.height = height;
    }
}

fn extract_screenshot_path(rest: &str, result: &mut CaptureResult) {
    let path = rest.trim();
    if !path.is_empty() {
        result.screenshot_path = Some(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use serde_json::json;
    use std::time::Duration;

    fn outcome(exit_code: Option<i32>, stdout: &str, stderr: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            policy: WaitPolicy::Delegated,
            timed_out: false,
        }
    }

    #[test]
    fn test_capture_markers() {
        let stdout = "Captured CLI screenshot: /tmp/cli-vision/abc/cli.png\n  Size: 1920x1280 (terminal: 120x40)\n";
        let result = parse_capture(stdout);
        assert!(result.success);
        assert_eq!(result.screenshot_path.as_deref(), Some("/tmp/cli-vision/abc/cli.png"));
        assert_eq!((result.width, result.height), (1920, 1280));
    }

    #[test]
    fn test_capture_no_markers() {
        let result = parse_outcome(Capability::Capture, &outcome(Some(0), "", ""));
        assert_eq!(
            result.to_value().unwrap(),
            json!({"success": true, "error": null, "screenshot_path": null, "width": 0, "height": 0})
        );
    }

    #[test]
    fn test_capture_first_match_wins() {
        let stdout = "Size: 800x600\nCaptured CLI screenshot: /a.png\nSize: 1x1\nCaptured CLI screenshot: /b.png\n";
        let result = parse_capture(stdout);
        assert_eq!((result.width, result.height), (800, 600));
        assert_eq!(result.screenshot_path.as_deref(), Some("/a.png"));
    }

    #[test]
    fn test_capture_malformed_size_tolerated() {
        for stdout in ["Size: wide x tall", "Size: 1920xabc", "Size:", "Size: 1920"] {
            let result = parse_capture(stdout);
            assert!(result.success);
            assert_eq!((result.width, result.height), (0, 0), "input {:?}", stdout);
        }
    }

    #[test]
    fn test_nonzero_exit_uses_stderr() {
        let result = parse_outcome(
            Capability::Capture,
            &outcome(Some(2), "Size: 10x10", "error: binary crashed\n"),
        );
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("Capture failed: error: binary crashed"));

        let result = parse_outcome(Capability::Session, &outcome(Some(1), "{\"success\":true}", ""));
        assert!(!result.is_success());
        assert!(result.error().unwrap().starts_with("Tool failed: "));
        assert!(result.error().unwrap().contains("status 1"));
    }

    #[test]
    fn test_signal_exit() {
        let result = parse_outcome(Capability::Session, &outcome(None, "", ""));
        assert!(result.error().unwrap().contains("signal"));
    }

    #[test]
    fn test_timeout_message() {
        let mut timed_out = outcome(None, "", "");
        timed_out.timed_out = true;
        timed_out.policy = WaitPolicy::Bounded(Duration::from_secs(60));

        let result = parse_outcome(Capability::Capture, &timed_out);
        assert_eq!(
            result.error(),
            Some("Capture timed out (60s) - app may be waiting for input")
        );
        let value = result.to_value().unwrap();
        assert_eq!(value["screenshot_path"], json!(null));
        assert_eq!(value["width"], 0);
    }

    #[test]
    fn test_sub_second_timeout_message() {
        let mut timed_out = outcome(None, "", "");
        timed_out.timed_out = true;
        timed_out.policy = WaitPolicy::Bounded(Duration::from_millis(500));

        let result = parse_outcome(Capability::Capture, &timed_out);
        assert_eq!(
            result.error(),
            Some("Capture timed out (0.5s) - app may be waiting for input")
        );
    }

    #[test]
    fn test_session_pass_through() {
        let raw = json!({
            "success": true,
            "error": null,
            "states": [
                {"step": 0, "input": null, "screenshot_path": "/tmp/s/step_000.png", "description": "A menu"},
                {"step": 1, "input": "enter", "screenshot_path": "/tmp/s/step_001.png", "description": null}
            ]
        });
        let result = parse_outcome(
            Capability::Session,
            &outcome(Some(0), &serde_json::to_string_pretty(&raw).unwrap(), "warning: slow VLM"),
        );
        assert_eq!(result.to_value().unwrap(), raw);
    }

    #[test]
    fn test_session_parse_failure_echoes_stdout() {
        let result = parse_outcome(Capability::Session, &outcome(Some(0), "Run completed: 3 states", ""));
        let error = result.error().unwrap();
        assert!(error.starts_with("Failed to parse output: "));
        assert!(error.contains("Stdout: Run completed: 3 states"));
        assert_eq!(result.to_value().unwrap()["states"], json!([]));

        let result = parse_outcome(Capability::Session, &outcome(Some(0), "[1, 2]", ""));
        assert!(!result.is_success());
    }

    #[test]
    fn test_session_failure_normalised() {
        let stdout = r#"{"success": false, "error": null, "states": [{"step": 0, "input": null, "screenshot_path": "/x.png", "description": null}]}"#;
        let result = parse_session(stdout).unwrap();
        assert!(!result.success);
        assert!(!result.error.unwrap().is_empty());
        assert!(result.states.is_empty());
    }

    #[quickcheck]
    fn prop_nonzero_exit_always_fails(code: i32, stdout: String, stderr: String, capture: bool) -> bool {
        if code == 0 {
            return true;
        }
        let capability = if capture { Capability::Capture } else { Capability::Session };
        let result = parse_outcome(capability, &outcome(Some(code), &stdout, &stderr));
        !result.is_success() && result.error().map(|e| !e.is_empty()).unwrap_or(false)
    }
}
