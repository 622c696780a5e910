//! `cukebridge config`

use std::path::Path;

use anyhow::bail;
use clap::Subcommand;
use tracing::info;

use crate::config::HostConfig;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Only `show` reads the file, so `init --force` can replace a broken one
pub async fn execute(cmd: ConfigCommands, path: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = HostConfig::load(path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            HostConfig::default().save(path)?;
            info!("Wrote {}", path.display());
        }
    }
    Ok(())
}
