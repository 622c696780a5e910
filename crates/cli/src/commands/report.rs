//! `cukebridge report`: feed recorded channel traffic to the formatters

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use cukebridge_common::{ChannelMessage, CompletionPayload, ResultChannel};
use cukebridge_report::RunResults;
use tracing::warn;

use super::ReporterArgs;
use crate::config::HostConfig;
use crate::reporters::build_hub;

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Channel traffic written by `run --record`
    #[arg(long)]
    pub results: PathBuf,

    #[command(flatten)]
    pub reporter: ReporterArgs,
}

pub async fn execute(args: ReportArgs, mut config: HostConfig) -> anyhow::Result<RunResults> {
    args.reporter.apply(&mut config);

    let content = tokio::fs::read_to_string(&args.results)
        .await
        .with_context(|| format!("reading {}", args.results.display()))?;

    let mut hub = build_hub(&config);
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let message: ChannelMessage = serde_json::from_str(line)
            .with_context(|| format!("{}:{}", args.results.display(), index + 1))?;
        message.deliver(&mut hub)?;
    }

    if !hub.is_browser_complete() {
        warn!("{} ends before the run completed", args.results.display());
        hub.complete(CompletionPayload::default())?;
    }
    Ok(hub.run_complete())
}
