//! Error types for the runner side

use thiserror::Error;

/// Failures of [`crate::page::PageController`] operations
///
/// These surface to step definitions as rejected operations, which the
/// engine records as failed steps.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Timeout waiting for '{selector}' after {timeout_ms} ms")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No page has been loaded")]
    NoCurrentPage,

    #[error("Page surface has been disposed")]
    Disposed,
}

pub type PageResult<T> = Result<T, PageError>;

/// Failures of the bootstrap and event pipeline
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to load feature {path}: {reason}")]
    FeatureLoad { path: String, reason: String },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid engine event at line {line}: {reason}")]
    EventDecode { line: usize, reason: String },

    #[error("Event out of order: {0}")]
    OutOfOrder(String),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Channel error: {0}")]
    Channel(#[from] cukebridge_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type RunnerResult<T> = Result<T, RunnerError>;
