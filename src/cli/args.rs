//! Command-line argument parsing
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::config::AdapterConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// cli-vision-mcp - Expose cli-vision TUI testing as MCP tools
#[derive(Parser, Debug)]
#[command(name = "cli-vision-mcp")]
#[command(version)]
#[command(about = "MCP server wrapping cli-vision for visual TUI testing", long_about = None)]
pub struct Args {
    /// Path to the cli-vision executable (overrides CLI_VISION_PATH)
    #[arg(short = 'e', long, global = true)]
    pub executable: Option<PathBuf>,

    /// Vision model endpoint used by tui_test analysis
    #[arg(long, global = true)]
    pub vlm_endpoint: Option<String>,

    /// Default delay between inputs in milliseconds
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Ceiling for tui_capture in seconds
    #[arg(long, global = true)]
    pub capture_timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand (serve when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP over stdin/stdout
    Serve,

    /// Check the cli-vision installation and VLM endpoint
    Doctor,

    /// Print the supported key catalogue as JSON
    Keys,

    /// Run one tool call and print its result JSON
    Call {
        /// Tool name (tui_test, tui_capture, list_supported_keys)
        #[arg(value_name = "TOOL")]
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(value_name = "ARGS_JSON", default_value = "{}")]
        args: String,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }

    /// Apply command-line overrides on top of a resolved configuration
    pub fn apply_overrides(&self, mut config: AdapterConfig) -> AdapterConfig {
        if let Some(executable) = &self.executable {
            config = config.with_executable(executable.clone());
        }
        if let Some(endpoint) = &self.vlm_endpoint {
            config = config.with_vlm_endpoint(endpoint.clone());
        }
        if let Some(delay_ms) = self.delay_ms {
            config = config.with_default_delay_ms(delay_ms);
        }
        if let Some(secs) = self.capture_timeout {
            config = config.with_capture_timeout(Duration::from_secs(secs));
        }
        config
    }
}

impl Verbosity {
    /// Default log directive for this level
    pub fn log_level(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }
}
