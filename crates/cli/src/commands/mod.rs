//! CLI commands

pub mod config;
pub mod report;
pub mod run;

use std::path::Path;

use clap::{Args, Subcommand};

use crate::config::HostConfig;
use crate::reporters::ReporterKind;

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run recorded engine events through the bridge and report them
    Run(run::RunArgs),

    /// Report channel traffic recorded by `run --record`
    Report(report::ReportArgs),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

/// Run one command; returns the process exit code
///
/// The configuration file is read only by the commands that need it.
pub async fn execute(command: Commands, config_path: &Path) -> anyhow::Result<i32> {
    match command {
        Commands::Run(args) => {
            let results = run::execute(args, HostConfig::load(config_path)?).await?;
            Ok(results.exit_code)
        }
        Commands::Report(args) => {
            let results = report::execute(args, HostConfig::load(config_path)?).await?;
            Ok(results.exit_code)
        }
        Commands::Config(cmd) => {
            config::execute(cmd, config_path).await?;
            Ok(0)
        }
        Commands::Version => {
            println!("Cukebridge CLI v{}", cukebridge_common::VERSION);
            Ok(0)
        }
    }
}

/// Formatter overrides shared by `run` and `report`
#[derive(Args, Debug, Clone, Default)]
pub struct ReporterArgs {
    /// Formatter to attach (repeatable); replaces the configured list
    #[arg(long = "reporter", value_enum)]
    pub reporters: Vec<ReporterKind>,

    /// Browser name results are attributed to
    #[arg(long)]
    pub browser: Option<String>,

    /// JSON report file name template
    #[arg(long)]
    pub output_file: Option<String>,
}

impl ReporterArgs {
    pub fn apply(&self, config: &mut HostConfig) {
        if !self.reporters.is_empty() {
            config.reporters = self.reporters.clone();
        }
        if let Some(browser) = &self.browser {
            config.browser_name = browser.clone();
        }
        if let Some(output_file) = &self.output_file {
            config.json_reporter.output_file = Some(output_file.clone());
        }
    }
}
