//! Engine that replays a recorded event stream
//!
//! A recording is one JSON-encoded [`EngineEvent`] per line, as captured
//! from an in-browser engine. Replaying feeds the events to the sink in
//! order, which exercises the whole normalization and reporting pipeline
//! without a browser.

use std::path::Path;

use async_trait::async_trait;
use cukebridge_common::EngineOptions;
use tracing::{debug, info, warn};

use crate::engine::{EngineEvent, EngineReport, EventSink, FeatureSource, TestEngine};
use crate::error::{RunnerError, RunnerResult};
use crate::support::SupportCode;

pub struct ReplayEngine {
    recording: String,
    coverage: Option<serde_json::Value>,
}

impl ReplayEngine {
    pub fn new(recording: impl Into<String>) -> Self {
        Self {
            recording: recording.into(),
            coverage: None,
        }
    }

    pub async fn from_file(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let recording = tokio::fs::read_to_string(path.as_ref()).await?;
        Ok(Self::new(recording))
    }

    /// Coverage handed back as if the page under test had collected it
    pub fn with_coverage(mut self, coverage: serde_json::Value) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Decode the whole recording up front so a bad line fails before any
    /// event is delivered
    pub fn events(&self) -> RunnerResult<Vec<EngineEvent>> {
        self.recording
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                EngineEvent::decode(line).map_err(|e| RunnerError::EventDecode {
                    line: index + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl TestEngine for ReplayEngine {
    async fn run(
        &mut self,
        features: Vec<FeatureSource>,
        _support: SupportCode,
        options: EngineOptions,
        sink: &mut dyn EventSink,
    ) -> RunnerResult<EngineReport> {
        let events = self.events()?;
        info!(
            "Replaying {} events ({} feature file(s) supplied)",
            events.len(),
            features.len()
        );
        for (name, values) in options.iter() {
            debug!("Engine option --{} {:?}", name, values);
        }

        for event in events {
            let name = event.name();
            match sink.hear(event) {
                Ok(()) => {}
                Err(RunnerError::OutOfOrder(reason)) => {
                    warn!("Dropping {} event: {}", name, reason)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(EngineReport {
            coverage: self.coverage.clone(),
        })
    }
}
