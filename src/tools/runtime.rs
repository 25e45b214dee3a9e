//! Tool runtime coordinator
//!
//! Entry point for tool calls from the transport. Routes by tool name and
//! runs Translate -> Invoke -> Parse. Holds only immutable configuration and
//! a stateless invoker, so concurrent calls share nothing mutable.

use crate::config::AdapterConfig;
use crate::errors::{AdapterError, Result};
use crate::tools::catalogue::KeyCatalogue;
use crate::tools::invoker::{ProcessInvoker, SubprocessInvoker};
use crate::tools::parser;
use crate::tools::registry::{ToolRegistry, TOOL_CAPTURE, TOOL_RUN_SESSION};
use crate::tools::translator;
use crate::tools::types::{Capability, ToolRequest, ToolResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Tool runtime coordinator
#[derive(Clone)]
pub struct ToolRuntime {
    config: Arc<AdapterConfig>,
    invoker: Arc<dyn ProcessInvoker>,
    registry: Arc<ToolRegistry>,
}

impl ToolRuntime {
    /// Create runtime spawning real cli-vision processes
    pub fn new(config: AdapterConfig) -> Self {
        Self::with_invoker(config, Arc::new(SubprocessInvoker::new()))
    }

    /// Create runtime with a custom invoker
    pub fn with_invoker(config: AdapterConfig, invoker: Arc<dyn ProcessInvoker>) -> Self {
        Self {
            config: Arc::new(config),
            invoker,
            registry: Arc::new(ToolRegistry::new()),
        }
    }

    /// Execute a tool call by name.
    ///
    /// Only an unknown tool name is an `Err`; everything that goes wrong
    /// inside a known tool comes back as a failed `ToolResult`.
    pub async fn execute(&self, tool: &str, args: &serde_json::Value) -> Result<ToolResult> {
        if !self.registry.contains(tool) {
            return Err(AdapterError::UnknownTool(tool.to_string()));
        }

        let capability = match tool {
            TOOL_RUN_SESSION => Some(Capability::Session),
            TOOL_CAPTURE => Some(Capability::Capture),
            _ => None,
        };

        match translator::parse_request(tool, args) {
            Ok(request) => Ok(self.execute_request(&request).await),
            Err(e @ AdapterError::UnknownTool(_)) => Err(e),
            Err(e) => {
                debug!("rejected {} call: {}", tool, e);
                Ok(match capability {
                    Some(capability) => ToolResult::failure(capability, &e),
                    None => ToolResult::Keys(KeyCatalogue::supported()),
                })
            }
        }
    }

    /// Execute a validated request
    pub async fn execute_request(&self, request: &ToolRequest) -> ToolResult {
        let capability = match request.capability() {
            Some(capability) => capability,
            None => return ToolResult::Keys(KeyCatalogue::supported()),
        };

        let start = Instant::now();
        let result = match self.run_process(request, capability).await {
            Ok(result) => result,
            Err(e) => ToolResult::failure(capability, &e),
        };

        info!(
            "{} finished in {}ms (success: {})",
            capability.subcommand(),
            start.elapsed().as_millis(),
            result.is_success()
        );
        result
    }

    async fn run_process(&self, request: &ToolRequest, capability: Capability) -> Result<ToolResult> {
        let spec = translator::translate(request, &self.config)?
            .ok_or_else(|| AdapterError::ConfigError("no command line for process-backed request".to_string()))?;
        let outcome = self
            .invoker
            .invoke(&spec, capability.wait_policy(&self.config))
            .await?;
        Ok(parser::parse_outcome(capability, &outcome))
    }

    /// Get tool registry
    pub fn get_registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    /// Check if tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Active configuration
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}
