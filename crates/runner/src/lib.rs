//! Cukebridge Runner
//!
//! Bridges a Gherkin engine to a result channel:
//! - Typed engine events and the engine contract
//! - Event listener that normalizes step results into records
//! - Page controller used by step definitions
//! - Support code registration and the per-scenario World
//! - Bootstrap that loads features and forwards completion

pub mod engine;
pub mod error;
pub mod listener;
pub mod page;
pub mod replay;
pub mod runner;
pub mod steps;
pub mod support;
pub mod surface;

pub use engine::{EngineEvent, EngineReport, EventSink, FeatureSource, TestEngine};
pub use error::{PageError, PageResult, RunnerError, RunnerResult};
pub use listener::{EventListener, RunContext};
pub use page::{MatchedNode, MatchedNodes, PageConfig, PageController};
pub use replay::ReplayEngine;
pub use runner::{discover_features, Runner, RunnerConfig};
pub use steps::browser_steps;
pub use support::{
    StepFailure, StepLookup, StepResult, SupportCode, SupportCodeLoader, SupportExport, World,
};
pub use surface::{HttpSurface, LoadEvent, Surface};
