//! Host side of the result channel: fans results out to every formatter

use cukebridge_common::{CompletionPayload, ProgressInfo, ResultChannel, ResultRecord};
use tracing::{debug, info};

use crate::reporter::{BrowserInfo, Reporter, RunResults};

/// Result channel for one browser, feeding all configured formatters
pub struct ReporterHub {
    browser: BrowserInfo,
    reporters: Vec<Box<dyn Reporter>>,
    total_steps: u64,
    coverage: Option<serde_json::Value>,
    browser_complete: bool,
}

impl ReporterHub {
    pub fn new(browser: BrowserInfo) -> Self {
        Self {
            browser,
            reporters: Vec::new(),
            total_steps: 0,
            coverage: None,
            browser_complete: false,
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn add(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    pub fn browser(&self) -> &BrowserInfo {
        &self.browser
    }

    /// Steps reported so far, per the browser's progress updates
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Coverage handed over with the completion signal
    pub fn coverage(&self) -> Option<&serde_json::Value> {
        self.coverage.as_ref()
    }

    pub fn is_browser_complete(&self) -> bool {
        self.browser_complete
    }

    /// Finish the run across all formatters
    ///
    /// The exit code is always 0: failing scenarios are results, not harness
    /// failures.
    pub fn run_complete(&mut self) -> RunResults {
        let mut results = RunResults::default();
        for reporter in &mut self.reporters {
            reporter.on_run_complete(&mut results);
        }
        results.exit_code = 0;
        results
    }
}

impl ResultChannel for ReporterHub {
    fn result(&mut self, record: ResultRecord) -> cukebridge_common::Result<()> {
        for reporter in &mut self.reporters {
            reporter.on_spec_complete(&self.browser, &record);
        }
        Ok(())
    }

    fn info(&mut self, info: ProgressInfo) -> cukebridge_common::Result<()> {
        debug!("{}: {} steps", self.browser.name, info.total);
        self.total_steps = info.total;
        Ok(())
    }

    fn log(&mut self, message: String) -> cukebridge_common::Result<()> {
        for reporter in &mut self.reporters {
            reporter.on_browser_log(&self.browser, &message);
        }
        Ok(())
    }

    fn complete(&mut self, payload: CompletionPayload) -> cukebridge_common::Result<()> {
        if payload.coverage.is_some() {
            info!("{}: coverage collected", self.browser.name);
        }
        self.coverage = payload.coverage;
        for reporter in &mut self.reporters {
            reporter.on_browser_complete(&self.browser);
        }
        self.browser_complete = true;
        Ok(())
    }
}
