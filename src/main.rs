//! cli-vision-mcp - Main CLI Entry Point

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli_vision_mcp::{
    cli::{Args, Commands},
    config::AdapterConfig,
    doctor::Doctor,
    server::McpServer,
    telemetry,
    tools::{KeyCatalogue, ToolRuntime},
};
use tokio::io::BufReader;
use tracing::info;

/// Resolve configuration: defaults, file, environment, then flags
fn load_config(args: &Args) -> Result<AdapterConfig> {
    let config = AdapterConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = args.apply_overrides(config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Serve MCP on stdin/stdout until the client disconnects
async fn run_server(config: AdapterConfig) -> Result<()> {
    info!(
        "starting cli-vision-mcp {} (cli-vision: {})",
        env!("CARGO_PKG_VERSION"),
        config.executable.display()
    );

    let server = McpServer::new(ToolRuntime::new(config));
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("MCP server stopped with an I/O error")?;
    Ok(())
}

/// Run system diagnostics
async fn run_doctor(config: AdapterConfig) -> Result<()> {
    let checks = Doctor::new(config).run_diagnostics().await;
    Doctor::display_results(&checks);

    if Doctor::overall_status(&checks) {
        println!("All checks passed");
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_keys() -> Result<()> {
    let catalogue = serde_json::to_string_pretty(&KeyCatalogue::supported())?;
    println!("{}", catalogue);
    Ok(())
}

/// One-shot tool call; exits 1 when the tool reports failure
async fn run_call(config: AdapterConfig, tool: &str, raw_args: &str) -> Result<()> {
    let tool_args: serde_json::Value = serde_json::from_str(raw_args)
        .with_context(|| format!("ARGS_JSON is not valid JSON: {}", raw_args))?;

    let runtime = ToolRuntime::new(config);
    if !runtime.has_tool(tool) {
        bail!(
            "Unknown tool: {} (available: {})",
            tool,
            runtime.tool_names().join(", ")
        );
    }

    let result = runtime.execute(tool, &tool_args).await?;
    println!("{}", serde_json::to_string_pretty(&result.to_value()?)?);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_logging(args.verbosity());

    match args.command() {
        Commands::Serve => run_server(load_config(&args)?).await?,
        Commands::Doctor => run_doctor(load_config(&args)?).await?,
        Commands::Keys => print_keys()?,
        Commands::Call { tool, args: raw } => run_call(load_config(&args)?, &tool, &raw).await?,
    }

    Ok(())
}
