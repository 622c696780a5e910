//! Cukebridge CLI - Main Entry Point

use std::path::PathBuf;

use clap::Parser;
use cukebridge_cli::commands::{self, Commands};

/// Cukebridge - Gherkin results from the browser to your terminal
#[derive(Parser)]
#[command(name = "cukebridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "cukebridge.toml", env = "CUKEBRIDGE_CONFIG", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = commands::execute(cli.command, &cli.config).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
