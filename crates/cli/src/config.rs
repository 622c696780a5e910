//! Host configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use cukebridge_report::JsonReportConfig;
use cukebridge_runner::PageConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::reporters::ReporterKind;

/// Host configuration, read from `cukebridge.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory relative paths are resolved against
    pub base_path: PathBuf,

    /// Base URL for relative navigation in step definitions
    pub base_url: Option<String>,

    /// Name of the browser results are attributed to
    pub browser_name: String,

    /// Formatters attached to the run
    pub reporters: Vec<ReporterKind>,

    /// JSON formatter settings
    pub json_reporter: JsonReporterConfig,

    /// Feature files or directories, in run order
    pub features: Vec<String>,

    /// Engine arguments, e.g. `["--tags", "@smoke"]`
    pub args: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            base_url: None,
            browser_name: "Headless".to_string(),
            reporters: vec![ReporterKind::Progress],
            json_reporter: JsonReporterConfig::default(),
            features: vec!["features".to_string()],
            args: Vec::new(),
        }
    }
}

/// JSON formatter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonReporterConfig {
    /// File name template, `{browserName}` and `{shortBrowserName}` allowed.
    /// Unset means the report is printed.
    pub output_file: Option<String>,

    /// Directory for the file, under `base_path`
    pub output_dir: PathBuf,
}

impl Default for JsonReporterConfig {
    fn default() -> Self {
        Self {
            output_file: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl HostConfig {
    /// Load configuration from file, or defaults when it does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn json_report_config(&self) -> JsonReportConfig {
        JsonReportConfig {
            output_file: self.json_reporter.output_file.clone(),
            output_dir: self.json_reporter.output_dir.clone(),
            base_path: self.base_path.clone(),
        }
    }

    pub fn page_config(&self) -> anyhow::Result<PageConfig> {
        let base_url = self
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("invalid base_url")?;
        Ok(PageConfig { base_url })
    }

    /// Feature locations with local paths resolved against `base_path`
    pub fn feature_paths(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|feature| {
                if feature.starts_with("http://") || feature.starts_with("https://") {
                    feature.clone()
                } else {
                    self.base_path.join(feature).to_string_lossy().into_owned()
                }
            })
            .collect()
    }
}
