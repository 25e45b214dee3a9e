//! Stdio MCP server
//!
//! Line-delimited JSON-RPC 2.0. Each request line is handled on its own
//! task so a long `tui_test` never blocks `ping` or a second call; responses
//! go through one channel to a single writer so lines never interleave.

pub mod protocol;

use crate::errors::{AdapterError, Result};
use crate::telemetry::TelemetryCollector;
use crate::tools::runtime::ToolRuntime;
use protocol::{
    initialize_result, CallToolParams, CallToolResult, ListToolsResult, McpRequest, McpResponse,
    McpTool, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Queued responses before request tasks wait on the writer
const RESPONSE_QUEUE: usize = 64;

/// MCP request handler over a shared tool runtime
#[derive(Clone)]
pub struct McpServer {
    runtime: ToolRuntime,
    telemetry: TelemetryCollector,
}

impl McpServer {
    pub fn new(runtime: ToolRuntime) -> Self {
        Self {
            runtime,
            telemetry: TelemetryCollector::new(),
        }
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Serve until the reader hits EOF and every in-flight call has answered
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::channel::<McpResponse>(RESPONSE_QUEUE);

        let read_loop = async move {
            let mut lines = reader.lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                let server = self.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(response) = server.handle_line(&line).await {
                        if tx.send(response).await.is_err() {
                            warn!("response dropped, writer has stopped");
                        }
                    }
                });
            }
            debug!("stdin closed");
            drop(tx);
            Ok::<(), AdapterError>(())
        };

        let write_loop = async {
            while let Some(response) = rx.recv().await {
                let mut bytes = serde_json::to_vec(&response)?;
                bytes.push(b'\n');
                writer.write_all(&bytes).await?;
                writer.flush().await?;
            }
            Ok::<(), AdapterError>(())
        };

        tokio::try_join!(read_loop, write_loop)?;
        info!("{}", self.telemetry.summary());
        Ok(())
    }

    /// Handle one raw line; `None` for notifications
    pub async fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                self.telemetry.protocol_error();
                return Some(McpResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<McpRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                self.telemetry.protocol_error();
                Some(McpResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ))
            }
        }
    }

    /// Dispatch a decoded request
    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            debug!("notification {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if let Some(version) = request.jsonrpc.as_deref() {
            if version != JSONRPC_VERSION {
                self.telemetry.protocol_error();
                return Some(McpResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Unsupported jsonrpc version: {}", version),
                ));
            }
        }

        let response = match request.method.as_str() {
            "initialize" => McpResponse::success(id, initialize_result(request.params.as_ref())),
            "ping" => McpResponse::success(id, json!({})),
            "tools/list" => self.list_tools(id),
            "tools/call" => self.call_tool(id, request.params).await,
            other => {
                self.telemetry.protocol_error();
                McpResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        };
        Some(response)
    }

    fn list_tools(&self, id: Value) -> McpResponse {
        let tools = self
            .runtime
            .get_registry()
            .schemas()
            .iter()
            .map(McpTool::from)
            .collect();
        match serde_json::to_value(ListToolsResult { tools }) {
            Ok(result) => McpResponse::success(id, result),
            Err(e) => McpResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> McpResponse {
        let params = match params.map(serde_json::from_value::<CallToolParams>).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                self.telemetry.protocol_error();
                return McpResponse::error(id, INVALID_PARAMS, "Missing params for tools/call");
            }
            Err(e) => {
                self.telemetry.protocol_error();
                return McpResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e));
            }
        };

        if !self.runtime.has_tool(&params.name) {
            self.telemetry.protocol_error();
            let err = AdapterError::UnknownTool(params.name);
            return McpResponse::error(id, INVALID_PARAMS, err.to_string());
        }

        let args = params.arguments.unwrap_or_else(|| json!({}));
        info!("tools/call {}", params.name);
        self.telemetry.call_started();

        let result = match self.runtime.execute(&params.name, &args).await {
            Ok(result) => result,
            Err(e) => {
                self.telemetry.call_finished(false);
                return McpResponse::error(id, INVALID_PARAMS, e.to_string());
            }
        };
        self.telemetry.call_finished(result.is_success());

        match CallToolResult::from_result(&result).and_then(|r| Ok(serde_json::to_value(r)?)) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => McpResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;
    use std::collections::HashMap;

    fn server() -> McpServer {
        let config = AdapterConfig::default().with_executable("/nonexistent/cli-vision");
        McpServer::new(ToolRuntime::new(config))
    }

    async fn run(input: &str) -> HashMap<String, Value> {
        let mut out = Vec::new();
        server().serve(input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| {
                let value: Value = serde_json::from_str(line).unwrap();
                (value["id"].to_string(), value)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_handshake_and_list() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#, "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#, "\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 3);

        assert_eq!(responses["1"]["result"]["protocolVersion"], "2024-11-05");
        let tools = responses["2"]["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["tui_test", "tui_capture", "list_supported_keys"]);
        assert!(tools[0]["inputSchema"]["properties"]["binary"].is_object());
        assert_eq!(responses["3"]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_call_list_keys() {
        let input = r#"{"jsonrpc":"2.0","id":"k","method":"tools/call","params":{"name":"list_supported_keys"}}"#;
        let responses = run(input).await;
        let result = &responses["\"k\""]["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["function_keys"].as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_tool_failure_is_result_not_error() {
        let input = r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"tui_capture","arguments":{"binary":"/bin/sh"}}}"#;
        let responses = run(input).await;
        let result = &responses["5"]["result"];
        assert_eq!(result["isError"], true);
        let error = result["structuredContent"]["error"].as_str().unwrap();
        assert!(error.contains("CLI_VISION_PATH"));
        assert!(responses["5"].get("error").is_none());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let input = concat!(
            "not json\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"run_command"}}"#, "\n",
            r#"{"jsonrpc":"2.0","id":3}"#, "\n",
        );
        let responses = run(input).await;
        assert_eq!(responses["null"]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses["1"]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses["2"]["error"]["code"], INVALID_PARAMS);
        assert_eq!(responses["2"]["error"]["message"], "Unknown tool: run_command");
        assert_eq!(responses["3"]["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_telemetry_counts_calls() {
        let server = server();
        let request = |id: u32, name: &str| {
            serde_json::from_value::<McpRequest>(json!({
                "jsonrpc": "2.0", "id": id, "method": "tools/call",
                "params": {"name": name, "arguments": {"binary": "/bin/sh"}}
            }))
            .unwrap()
        };

        server.handle_request(request(1, "list_supported_keys")).await.unwrap();
        server.handle_request(request(2, "tui_capture")).await.unwrap();
        server.handle_request(request(3, "nope")).await.unwrap();

        let stats = server.telemetry().get_stats();
        assert_eq!(stats.calls_started, 2);
        assert_eq!(stats.calls_succeeded, 1);
        assert_eq!(stats.calls_failed, 1);
        assert_eq!(stats.protocol_errors, 1);
    }
}
