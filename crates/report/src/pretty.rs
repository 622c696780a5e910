//! Pretty formatter: a hierarchical transcript
//!
//! ```text
//! Feature: Login
//!   As a user I want to log in
//!
//!   @smoke
//!   Scenario: Valid credentials      # features/login.feature:7
//!     Given I am on the login page   # steps/login.rs:12
//!     Then I am logged in            # steps/login.rs:19
//! ```
//!
//! Features print as soon as their first step arrives. Steps are buffered
//! per scenario so the `#` source column can be aligned, and the scenario is
//! printed when the next one starts or the browser completes.

use std::time::Instant;

use colored::Colorize;
use cukebridge_common::{Feature, ResultRecord, Scenario, StatsBook, Step, StepStatus};

use crate::reporter::{emit, stdout, BrowserInfo, Output, Reporter, RunResults};
use crate::summary;

struct BufferedStep {
    step: Step,
    log: Vec<String>,
}

pub struct PrettyReporter {
    out: Output,
    feature: Option<Feature>,
    scenario: Option<Scenario>,
    steps: Vec<BufferedStep>,
    step_log: Vec<String>,
    stats: StatsBook,
    started: Instant,
}

impl Default for PrettyReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrettyReporter {
    pub fn new() -> Self {
        Self::with_output(stdout())
    }

    pub fn with_output(out: Output) -> Self {
        Self {
            out,
            feature: None,
            scenario: None,
            steps: Vec::new(),
            step_log: Vec::new(),
            stats: StatsBook::new(),
            started: Instant::now(),
        }
    }

    pub fn stats(&self) -> &StatsBook {
        &self.stats
    }

    fn report_feature(&mut self, feature: &Feature) {
        let mut text = padded(
            &format!("{}: {}", feature.keyword.bold(), feature.name),
            0,
            true,
            true,
        );
        text.push_str(&padded(&feature.description, 2, false, true));
        emit(&mut self.out, &text);
    }

    fn flush_scenario(&mut self) {
        let Some(scenario) = self.scenario.take() else {
            return;
        };
        let steps = std::mem::take(&mut self.steps);
        let uri = self.feature.as_ref().map(|f| f.uri.as_str()).unwrap_or_default();
        let text = render_scenario(uri, &scenario, &steps);
        emit(&mut self.out, &text);
    }
}

impl Reporter for PrettyReporter {
    fn on_spec_complete(&mut self, _browser: &BrowserInfo, result: &ResultRecord) {
        self.stats.record(result);

        let new_scenario = self
            .scenario
            .as_ref()
            .map_or(true, |s| s.id != result.scenario.id);
        if new_scenario {
            self.flush_scenario();
            self.scenario = Some(result.scenario.clone());
        }

        let new_feature = self
            .feature
            .as_ref()
            .map_or(true, |f| f.uri != result.feature.uri);
        if new_feature {
            self.feature = Some(result.feature.clone());
            self.report_feature(&result.feature);
        }

        self.steps.push(BufferedStep {
            step: result.step.clone(),
            log: std::mem::take(&mut self.step_log),
        });
    }

    fn on_browser_log(&mut self, _browser: &BrowserInfo, message: &str) {
        self.step_log.push(message.to_string());
    }

    fn on_browser_complete(&mut self, _browser: &BrowserInfo) {
        self.flush_scenario();
        self.feature = None;
    }

    fn on_run_complete(&mut self, _results: &mut RunResults) {
        let text = summary::render(&self.stats, self.started.elapsed());
        emit(&mut self.out, &text);
    }
}

fn render_scenario(uri: &str, scenario: &Scenario, steps: &[BufferedStep]) -> String {
    let label_len = scenario.keyword.chars().count() + 2 + scenario.name.chars().count();
    let column = steps
        .iter()
        .map(|s| 4 + step_label_len(&s.step))
        .fold(2 + label_len, usize::max);

    let mut text = String::new();
    if !scenario.tags.is_empty() {
        let tags: Vec<&str> = scenario.tags.iter().map(|t| t.name.as_str()).collect();
        text.push_str(&padded(&tags.join(" ").cyan().to_string(), 2, true, false));
    }
    text.push_str(&padded(
        &format!("{}: {}", scenario.keyword.bold(), scenario.name),
        2,
        true,
        false,
    ));
    text.push_str(&padded(
        &source(&format!("{}:{}", uri, scenario.line)),
        column.saturating_sub(label_len),
        false,
        true,
    ));

    for buffered in steps {
        text.push_str(&render_step(buffered, column));
    }
    text
}

fn render_step(buffered: &BufferedStep, column: usize) -> String {
    let step = &buffered.step;
    let label = format!("{}{}", step.keyword.bold(), step.name);
    let label = match step.result.status {
        Some(StepStatus::Passed) => label.green().to_string(),
        Some(StepStatus::Failed) => label.red().to_string(),
        Some(StepStatus::Skipped | StepStatus::Pending | StepStatus::Undefined) => {
            label.cyan().to_string()
        }
        _ => label,
    };

    let mut text = padded(&label, 4, false, false);
    text.push_str(&padded(
        &source(&step.step_match.location),
        column.saturating_sub(step_label_len(step) + 2),
        false,
        true,
    ));
    if !buffered.log.is_empty() {
        text.push_str(&padded(&buffered.log.concat().bold().dimmed().to_string(), 4, false, true));
    }
    if !step.result.error_message.is_empty() {
        text.push_str(&padded(&step.result.error_message.red().to_string(), 4, false, true));
    }
    text
}

fn step_label_len(step: &Step) -> usize {
    step.keyword.chars().count() + step.name.chars().count()
}

fn source(location: &str) -> String {
    if location.is_empty() {
        String::new()
    } else {
        format!(" # {}", location)
    }
}

/// Indent every line of `text` by `pad` spaces and drop trailing whitespace
fn padded(text: &str, pad: usize, break_before: bool, break_after: bool) -> String {
    let padding = " ".repeat(pad);
    let body = text
        .split('\n')
        .map(|line| format!("{}{}", padding, line).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = String::new();
    if break_before {
        out.push('\n');
    }
    out.push_str(&body);
    if break_after {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::testing::SharedBuffer;
    use cukebridge_common::Tag;

    fn record(scenario: &str, keyword: &str, step: &str, status: StepStatus) -> ResultRecord {
        let feature = Feature::new(
            "Login",
            "features/login.feature",
            "As a user\nI want to log in",
            1,
            "Feature",
            vec![],
        );
        let tags = vec![Tag {
            name: "@smoke".to_string(),
            line: 6,
        }];
        let scenario = Scenario::new(&feature.id, scenario, 7, "", tags);
        let mut step = Step::started(keyword, step, 8, "steps/login.rs:12");
        step.result.status = Some(status);
        ResultRecord::new(feature, scenario, step)
    }

    fn reporter() -> (PrettyReporter, SharedBuffer) {
        colored::control::set_override(false);
        let buffer = SharedBuffer::default();
        (PrettyReporter::with_output(Box::new(buffer.clone())), buffer)
    }

    #[test]
    fn test_padded() {
        assert_eq!(padded("a\nb  ", 2, false, true), "  a\n  b\n");
        assert_eq!(padded("x", 0, true, false), "\nx");
        assert_eq!(padded("", 2, false, true), "\n");
    }

    #[test]
    fn test_feature_prints_immediately_scenario_on_flush() {
        let (mut reporter, buffer) = reporter();
        let browser = BrowserInfo::new("Headless");
        reporter.on_spec_complete(&browser, &record("Valid", "Given ", "I am on the login page", StepStatus::Passed));

        assert_eq!(buffer.contents(), "\nFeature: Login\n  As a user\n  I want to log in\n");

        reporter.on_browser_complete(&browser);
        let contents = buffer.contents();
        assert!(contents.contains("\n  @smoke\n  Scenario: Valid"));
        assert!(contents.contains("    Given I am on the login page   # steps/login.rs:12\n"));
    }

    #[test]
    fn test_source_column_is_aligned() {
        let (mut reporter, buffer) = reporter();
        let browser = BrowserInfo::new("Headless");
        reporter.on_spec_complete(&browser, &record("Valid", "Given ", "a much longer step name", StepStatus::Passed));
        reporter.on_spec_complete(&browser, &record("Valid", "Then ", "short", StepStatus::Passed));
        reporter.on_browser_complete(&browser);

        let contents = buffer.contents();
        let columns: Vec<usize> = contents
            .lines()
            .filter(|line| line.contains(" # "))
            .map(|line| line.find(" # ").unwrap())
            .collect();
        assert_eq!(columns.len(), 3);
        assert!(columns.iter().all(|&c| c == columns[0]));
        assert!(contents.contains("  Scenario: Valid") && contents.contains("# features/login.feature:7"));
    }

    #[test]
    fn test_scenario_flushed_when_next_starts() {
        let (mut reporter, buffer) = reporter();
        let browser = BrowserInfo::new("Headless");
        reporter.on_spec_complete(&browser, &record("First", "Given ", "one", StepStatus::Passed));
        assert!(!buffer.contents().contains("Scenario: First"));

        reporter.on_spec_complete(&browser, &record("Second", "Given ", "two", StepStatus::Failed));
        assert!(buffer.contents().contains("Scenario: First"));
        assert!(!buffer.contents().contains("Scenario: Second"));
        // Same feature: printed once
        assert_eq!(buffer.contents().matches("Feature: Login").count(), 1);
    }

    #[test]
    fn test_logs_and_errors_follow_their_step() {
        let (mut reporter, buffer) = reporter();
        let browser = BrowserInfo::new("Headless");
        reporter.on_browser_log(&browser, "LOG: 'clicked'\n");
        let mut failing = record("Valid", "Then ", "I am logged in", StepStatus::Failed);
        failing.step.result.error_message = "Error: expected\nat steps/login.rs:19".to_string();
        reporter.on_spec_complete(&browser, &failing);
        reporter.on_browser_complete(&browser);

        let contents = buffer.contents();
        let step = contents.find("Then I am logged in").unwrap();
        let log = contents.find("    LOG: 'clicked'").unwrap();
        let error = contents.find("    Error: expected\n    at steps/login.rs:19").unwrap();
        assert!(step < log && log < error);
    }

    #[test]
    fn test_browser_complete_without_results_prints_nothing() {
        let (mut reporter, buffer) = reporter();
        reporter.on_browser_complete(&BrowserInfo::new("Headless"));
        assert!(buffer.contents().is_empty());
    }
}
