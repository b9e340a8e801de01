//! polysearch MCP Server & CLI
//!
//! Dual-mode application:
//! - MCP Server Mode (default): Model Context Protocol server using stdio
//! - CLI Mode: Command-line utility for direct tool execution
//!
//! Implements one tool:
//! - `search(query, records)` - Multi-strategy search over a record collection

use anyhow::Result;
use clap::Parser;
use polysearch::cli::{self, Cli, Commands};
use polysearch::{mcp, tools};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Detect mode: CLI if args present, MCP server otherwise
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        run_cli_mode().await
    } else {
        run_mcp_mode().await
    }
}

/// RUST_LOG wins over the verbosity flags when set
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();
}

/// Run in CLI mode
async fn run_cli_mode() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    init_logging(log_level);

    let result = match cli.command {
        Some(Commands::Search(args)) => execute_search_cli(args).await,
        None => {
            eprintln!("Error: No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

/// Execute search command in CLI mode
async fn execute_search_cli(args: cli::SearchArgs) -> Result<String> {
    use tokio::time::{timeout, Duration};

    let result = timeout(Duration::from_secs(120), tools::search::execute_search(args)).await;

    match result {
        Ok(Ok(tool_result)) => Ok(tool_result
            .content
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_default()),
        Ok(Err(e)) => Err(anyhow::anyhow!(e.message())),
        Err(_) => Err(anyhow::anyhow!("Request exceeded 120 second timeout")),
    }
}

/// Map error text to exit code
fn get_exit_code(err: &anyhow::Error) -> i32 {
    let err_str = err.to_string().to_lowercase();

    // Load errors often quote serde's "invalid type", so test them first
    if err_str.contains("failed to load records") || err_str.contains("configuration") {
        2 // Records or config file problem
    } else if err_str.contains("invalid") || err_str.contains("usage") {
        1 // Invalid arguments or usage error
    } else if err_str.contains("timeout") {
        4
    } else {
        5
    }
}

/// Run in MCP server mode
async fn run_mcp_mode() -> Result<()> {
    init_logging("info");

    info!("Starting polysearch MCP Server");

    mcp::handle_stdio().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(get_exit_code(&anyhow::anyhow!("Invalid input: query too long")), 1);
        assert_eq!(
            get_exit_code(&anyhow::anyhow!(
                "Failed to load records: data.json: record 1: invalid type: sequence, expected a map"
            )),
            2
        );
        assert_eq!(
            get_exit_code(&anyhow::anyhow!("Configuration error: invalid value for maxResults")),
            2
        );
        assert_eq!(get_exit_code(&anyhow::anyhow!("Request exceeded 120 second timeout")), 4);
        assert_eq!(get_exit_code(&anyhow::anyhow!("Internal error: boom")), 5);
    }
}
