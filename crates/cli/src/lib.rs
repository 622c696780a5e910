//! Cukebridge CLI
//!
//! Hosts a run for one browser: loads `cukebridge.toml`, drives the runner
//! and attaches the configured formatters to its result channel.

pub mod commands;
pub mod config;
pub mod reporters;

pub use config::{HostConfig, JsonReporterConfig};
pub use reporters::{build_hub, ReporterKind};
