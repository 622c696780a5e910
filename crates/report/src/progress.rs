//! Progress formatter: one character per step
//!
//! ```text
//! ...F--U..
//!
//! 2 Scenarios (1 passed, 0 incomplete, 1 failed)
//! ```

use std::time::Instant;

use colored::{ColoredString, Colorize};
use cukebridge_common::{ResultRecord, StatsBook, StepStatus};
use tracing::warn;

use crate::reporter::{emit, stdout, BrowserInfo, Output, Reporter, RunResults};
use crate::summary;

const LINE_WIDTH: usize = 80;

pub struct ProgressReporter {
    out: Output,
    written: usize,
    stats: StatsBook,
    started: Instant,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_output(stdout())
    }

    pub fn with_output(out: Output) -> Self {
        Self {
            out,
            written: 0,
            stats: StatsBook::new(),
            started: Instant::now(),
        }
    }

    pub fn stats(&self) -> &StatsBook {
        &self.stats
    }
}

pub fn status_char(status: StepStatus) -> ColoredString {
    match status {
        StepStatus::Ambiguous => "A".red(),
        StepStatus::Failed => "F".red(),
        StepStatus::Passed => ".".green(),
        StepStatus::Pending => "P".yellow(),
        StepStatus::Skipped => "-".cyan(),
        StepStatus::Undefined => "U".yellow(),
    }
}

impl Reporter for ProgressReporter {
    fn on_spec_complete(&mut self, _browser: &BrowserInfo, result: &ResultRecord) {
        self.stats.record(result);
        let Some(status) = result.step.result.status else {
            warn!("Step '{}' completed without a status", result.step.name);
            return;
        };
        if self.written % LINE_WIDTH == 0 {
            emit(&mut self.out, "\n");
        }
        emit(&mut self.out, &status_char(status).to_string());
        self.written += 1;
    }

    fn on_run_complete(&mut self, _results: &mut RunResults) {
        let text = summary::render(&self.stats, self.started.elapsed());
        emit(&mut self.out, &text);
    }
}
