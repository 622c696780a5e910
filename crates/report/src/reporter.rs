//! Formatter contract and the terminal plumbing shared by formatters

use std::io::Write;

use cukebridge_common::ResultRecord;
use tracing::error;

/// The browser a stream of results came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserInfo {
    /// Full name, e.g. `"Chrome Headless 120.0.0 (Linux x86_64)"`
    pub name: String,
}

impl BrowserInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Name up to the first `(` or `.`, e.g. `"Chrome Headless 120"`
    pub fn short_name(&self) -> &str {
        let end = self.name.find(|c: char| c == '(' || c == '.').unwrap_or(self.name.len());
        &self.name[..end]
    }
}

/// Outcome of a whole run as seen by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResults {
    pub exit_code: i32,
}

/// A report formatter
///
/// Formatters never fail the run: output problems are logged and swallowed.
pub trait Reporter: Send {
    /// One finished step
    fn on_spec_complete(&mut self, browser: &BrowserInfo, result: &ResultRecord);

    /// Console output captured from the browser
    fn on_browser_log(&mut self, _browser: &BrowserInfo, _message: &str) {}

    /// The browser finished its run; flush or reset per-browser state
    fn on_browser_complete(&mut self, _browser: &BrowserInfo) {}

    /// All browsers are done
    fn on_run_complete(&mut self, _results: &mut RunResults) {}
}

/// Where a formatter writes its terminal output
pub type Output = Box<dyn Write + Send>;

pub fn stdout() -> Output {
    Box::new(std::io::stdout())
}

/// Write `text` and flush, logging instead of failing
pub(crate) fn emit(out: &mut Output, text: &str) {
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        error!("Failed to write report output: {}", e);
    }
}
