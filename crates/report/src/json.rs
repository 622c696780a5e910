//! Cucumber-compatible JSON formatter
//!
//! Records are grouped as `[{...feature, browser, elements: [{...scenario,
//! steps: [...]}]}]`. The report is written once per browser, to the
//! configured file or, without one, to the terminal output.

use std::path::{Path, PathBuf};

use cukebridge_common::{Feature, ResultRecord, Scenario, Step};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::Result;
use crate::reporter::{emit, stdout, BrowserInfo, Output, Reporter, RunResults};

static BROWSER_NAME_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s.()]+").expect("static regex"));
static SHORT_NAME_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s.]+").expect("static regex"));
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("static regex"));

/// Where the JSON report goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonReportConfig {
    /// File name template; `{browserName}` and `{shortBrowserName}` are
    /// replaced. `None` sends the report to the terminal.
    pub output_file: Option<String>,
    /// Directory for the file, relative to `base_path` unless absolute
    pub output_dir: PathBuf,
    pub base_path: PathBuf,
}

impl Default for JsonReportConfig {
    fn default() -> Self {
        Self {
            output_file: None,
            output_dir: PathBuf::from("."),
            base_path: PathBuf::from("."),
        }
    }
}

impl JsonReportConfig {
    /// Resolved report path for `browser`, if a file is configured
    pub fn output_path(&self, browser: &BrowserInfo) -> Option<PathBuf> {
        let template = self.output_file.as_deref()?;
        let browser_name = BROWSER_NAME_NOISE.replace_all(&browser.name, "-");
        let short_name = SHORT_NAME_NOISE.replace_all(browser.short_name(), "-");
        let file_name = template
            .replace("{browserName}", browser_name.trim_matches('-'))
            .replace("{shortBrowserName}", short_name.trim_matches('-'));
        let file_name = HYPHEN_RUNS.replace_all(&file_name, "-");
        Some(self.base_path.join(&self.output_dir).join(file_name.as_ref()))
    }
}

#[derive(Debug, Serialize)]
struct FeatureReport {
    #[serde(flatten)]
    feature: Feature,
    browser: String,
    elements: Vec<ScenarioReport>,
}

#[derive(Debug, Serialize)]
struct ScenarioReport {
    #[serde(flatten)]
    scenario: Scenario,
    steps: Vec<Step>,
}

pub struct JsonReporter {
    config: JsonReportConfig,
    out: Output,
    report: Vec<FeatureReport>,
}

impl JsonReporter {
    pub fn new(config: JsonReportConfig) -> Self {
        Self::with_output(config, stdout())
    }

    pub fn with_output(config: JsonReportConfig, out: Output) -> Self {
        Self {
            config,
            out,
            report: Vec::new(),
        }
    }

    /// The report collected so far, as 4-space indented JSON
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.report.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }

    fn write_report(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render()?)?;
        Ok(())
    }
}

impl Reporter for JsonReporter {
    fn on_spec_complete(&mut self, browser: &BrowserInfo, result: &ResultRecord) {
        let new_feature = self
            .report
            .last()
            .map_or(true, |f| f.feature.uri != result.feature.uri);
        if new_feature {
            self.report.push(FeatureReport {
                feature: result.feature.clone(),
                browser: browser.name.clone(),
                elements: Vec::new(),
            });
        }
        let Some(feature) = self.report.last_mut() else {
            return;
        };

        let new_scenario = feature
            .elements
            .last()
            .map_or(true, |s| s.scenario.id != result.scenario.id);
        if new_scenario {
            feature.elements.push(ScenarioReport {
                scenario: result.scenario.clone(),
                steps: Vec::new(),
            });
        }
        if let Some(scenario) = feature.elements.last_mut() {
            scenario.steps.push(result.step.clone());
        }
    }

    fn on_browser_complete(&mut self, browser: &BrowserInfo) {
        match self.config.output_path(browser) {
            Some(path) => match self.write_report(&path) {
                Ok(()) => debug!("JSON report written to {}", path.display()),
                Err(e) => error!("Failed to write JSON report to {}: {}", path.display(), e),
            },
            None => match self.render() {
                Ok(json) => emit(&mut self.out, &format!("{}\n", json)),
                Err(e) => error!("Failed to render JSON report: {}", e),
            },
        }
        self.report.clear();
    }

    fn on_run_complete(&mut self, results: &mut RunResults) {
        results.exit_code = 0;
    }
}
