//! Error types for Cukebridge

use thiserror::Error;

/// Result type alias using the Cukebridge common error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across Cukebridge crates
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unknown step status: {0}")]
    InvalidStatus(String),
}
