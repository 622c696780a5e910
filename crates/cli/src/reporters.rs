//! Formatter selection

use clap::ValueEnum;
use cukebridge_report::{
    BrowserInfo, JsonReporter, PrettyReporter, ProgressReporter, Reporter, ReporterHub,
};
use serde::{Deserialize, Serialize};

use crate::config::HostConfig;

/// Formatter attached to a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    /// Cucumber-compatible JSON report
    Json,
    /// Hierarchical transcript with aligned sources
    Pretty,
    /// One character per step
    Progress,
}

impl ReporterKind {
    pub fn build(self, config: &HostConfig) -> Box<dyn Reporter> {
        match self {
            ReporterKind::Json => Box::new(JsonReporter::new(config.json_report_config())),
            ReporterKind::Pretty => Box::new(PrettyReporter::new()),
            ReporterKind::Progress => Box::new(ProgressReporter::new()),
        }
    }
}

/// Hub for the configured browser with every configured formatter attached
pub fn build_hub(config: &HostConfig) -> ReporterHub {
    let mut hub = ReporterHub::new(BrowserInfo::new(config.browser_name.as_str()));
    for kind in &config.reporters {
        hub.add(kind.build(config));
    }
    hub
}
