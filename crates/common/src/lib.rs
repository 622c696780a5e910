//! Cukebridge Common Library
//!
//! The normalized result model, the sanitization rules applied to paths and
//! stack traces, per-scenario statistics, engine option parsing and the
//! result channel contract shared by the runner and the report formatters.

pub mod attachment;
pub mod channel;
pub mod error;
pub mod model;
pub mod options;
pub mod sanitize;
pub mod stats;

pub use attachment::Embedding;
pub use channel::{ChannelMessage, JsonLinesChannel, MemoryChannel, ResultChannel, TeeChannel};
pub use error::{Error, Result};
pub use model::*;
pub use options::EngineOptions;
pub use stats::{RunStats, ScenarioSummary, ScenarioTotals, StatsBook, StepTotals};

/// Cukebridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
