//! Cukebridge Report
//!
//! Host-side consumers of step results:
//! - `ReporterHub`, the result channel that fans out to formatters
//! - JSON formatter (Cucumber-compatible report file)
//! - Pretty formatter (hierarchical, coloured transcript)
//! - Progress formatter (one character per step)

pub mod error;
pub mod hub;
pub mod json;
pub mod pretty;
pub mod progress;
pub mod reporter;
pub mod summary;

pub use error::{ReportError, Result};
pub use hub::ReporterHub;
pub use json::{JsonReportConfig, JsonReporter};
pub use pretty::PrettyReporter;
pub use progress::ProgressReporter;
pub use reporter::{BrowserInfo, Output, Reporter, RunResults};
