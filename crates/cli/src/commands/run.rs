//! `cukebridge run`: replay a recorded engine run through the bridge

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use cukebridge_common::{JsonLinesChannel, TeeChannel};
use cukebridge_report::RunResults;
use cukebridge_runner::{
    browser_steps, discover_features, ReplayEngine, Runner, RunnerConfig, SupportCodeLoader,
};
use tracing::{debug, info};

use super::ReporterArgs;
use crate::config::HostConfig;
use crate::reporters::build_hub;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Recorded engine events, one JSON object per line
    #[arg(long)]
    pub events: PathBuf,

    /// Feature file or directory (repeatable); replaces the configured list
    #[arg(long = "feature")]
    pub features: Vec<String>,

    /// Base URL for relative navigation
    #[arg(long)]
    pub base_url: Option<String>,

    /// Also write every channel call to this file
    #[arg(long)]
    pub record: Option<PathBuf>,

    #[command(flatten)]
    pub reporter: ReporterArgs,

    /// Engine arguments, e.g. `-- --tags @smoke`
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl RunArgs {
    fn apply(&self, config: &mut HostConfig) {
        self.reporter.apply(config);
        if !self.features.is_empty() {
            config.features = self.features.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if !self.args.is_empty() {
            config.args = self.args.clone();
        }
    }
}

pub async fn execute(args: RunArgs, mut config: HostConfig) -> anyhow::Result<RunResults> {
    args.apply(&mut config);

    let engine = ReplayEngine::from_file(&args.events)
        .await
        .with_context(|| format!("reading events from {}", args.events.display()))?;

    let mut loader = SupportCodeLoader::new();
    loader.register(browser_steps);

    let files = discover_features(&config.feature_paths());
    debug!("Discovered {} feature file(s)", files.len());
    let runner_config = RunnerConfig {
        files,
        args: config.args.clone(),
        page: config.page_config()?,
    };
    let mut runner = Runner::new(engine, loader, runner_config);
    let hub = build_hub(&config);

    let mut hub = match &args.record {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let recorder = JsonLinesChannel::new(BufWriter::new(file));
            let (hub, _) = runner.start(TeeChannel::new(hub, recorder)).await?.into_parts();
            info!("Channel traffic recorded to {}", path.display());
            hub
        }
        None => runner.start(hub).await?,
    };

    Ok(hub.run_complete())
}
