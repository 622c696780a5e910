//! Turns the engine's lifecycle events into normalized result records
//!
//! The listener keeps the feature, scenario and step currently being walked
//! in a [`RunContext`] it owns. Contexts are overwritten as the engine
//! advances and cleared at run start and run end; nothing is shared between
//! listeners, so every browser target gets its own.

use cukebridge_common::{
    sanitize, Embedding, Feature, ProgressInfo, ResultChannel, ResultRecord, Scenario, Step,
    StepStatus, Tag,
};
use tracing::{debug, error, warn};

use crate::engine::{
    EngineEvent, EventSink, FeaturePayload, ScenarioPayload, ScriptError, StepPayload,
    StepResultPayload, TagPayload,
};
use crate::error::{RunnerError, RunnerResult};

/// What the listener knows about the current position in the run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext {
    pub feature: Option<Feature>,
    pub scenario: Option<Scenario>,
    /// Last started step; stays in place after it finishes
    pub step: Option<Step>,
    /// Reported (non-hook) steps so far
    pub step_count: u64,
}

impl RunContext {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Engine event listener feeding one [`ResultChannel`]
pub struct EventListener<C: ResultChannel> {
    channel: C,
    context: RunContext,
}

impl<C: ResultChannel> EventListener<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            context: RunContext::default(),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Apply one event
    pub fn handle(&mut self, event: EngineEvent) -> RunnerResult<()> {
        match event {
            EngineEvent::RunStarted => self.context.reset(),
            EngineEvent::FeatureStarted(payload) => self.on_feature_started(payload),
            EngineEvent::ScenarioStarted(payload) => self.on_scenario_started(payload),
            EngineEvent::StepStarted(payload) => self.on_step_started(payload),
            EngineEvent::StepFinished(payload) => return self.on_step_finished(payload),
            EngineEvent::RunFinished => self.context.reset(),
            EngineEvent::ScriptError(script_error) => self.on_script_error(script_error),
        }
        Ok(())
    }

    fn on_feature_started(&mut self, payload: FeaturePayload) {
        debug!("Feature started: {}", payload.name);
        self.context.feature = Some(Feature::new(
            payload.name,
            sanitize::feature_uri(&payload.uri),
            payload.description,
            payload.line,
            payload.keyword,
            tags(payload.tags),
        ));
    }

    fn on_scenario_started(&mut self, payload: ScenarioPayload) {
        debug!("Scenario started: {}", payload.name);
        let feature_id = match &self.context.feature {
            Some(feature) => feature.id.as_str(),
            None => {
                warn!("Scenario '{}' started outside of a feature", payload.name);
                ""
            }
        };
        self.context.scenario = Some(Scenario::new(
            feature_id,
            payload.name,
            payload.line,
            payload.description,
            tags(payload.tags),
        ));
    }

    fn on_step_started(&mut self, payload: StepPayload) {
        let location = payload.location();
        self.context.step = Some(Step::started(
            payload.keyword,
            payload.name,
            payload.line,
            location,
        ));
    }

    fn on_step_finished(&mut self, payload: StepResultPayload) -> RunnerResult<()> {
        if payload.step.is_hook() {
            debug!("Skipping hook result: {}", payload.step.keyword.trim());
            return Ok(());
        }

        let feature = self
            .context
            .feature
            .clone()
            .ok_or_else(|| RunnerError::OutOfOrder("step finished outside of a feature".into()))?;
        let scenario = self
            .context
            .scenario
            .clone()
            .ok_or_else(|| RunnerError::OutOfOrder("step finished outside of a scenario".into()))?;
        let step = self
            .context
            .step
            .as_mut()
            .ok_or_else(|| RunnerError::OutOfOrder("step finished before it started".into()))?;

        if step.name != payload.step.name {
            warn!(
                "Finished step '{}' does not match started step '{}'",
                payload.step.name, step.name
            );
        }

        if let Some(location) = payload.step_definition.as_ref().and_then(|d| d.location()) {
            step.step_match.location = location;
        }
        step.step_match.location = sanitize::location(&step.step_match.location);

        step.result.status = Some(payload.status);
        step.result.duration = payload.duration.unwrap_or(0);

        if payload.status == StepStatus::Failed {
            if let Some(failure) = &payload.failure {
                step.result
                    .error_message
                    .push_str(&sanitize::stack_trace(failure.text()));
            }
        }

        if !payload.attachments.is_empty() {
            step.embeddings = Some(
                payload
                    .attachments
                    .iter()
                    .map(|a| Embedding::encode(a.mime_type.clone(), &a.data))
                    .collect(),
            );
        }

        let record = ResultRecord::new(feature, scenario, step.clone());

        self.context.step_count += 1;
        self.channel.info(ProgressInfo {
            total: self.context.step_count,
        })?;
        self.channel.result(record)?;
        Ok(())
    }

    fn on_script_error(&mut self, script_error: ScriptError) {
        let message = format!(
            "{} @ {}:{}:{}",
            script_error.message,
            sanitize::script_source(&script_error.source),
            script_error.line,
            script_error.column
        );
        error!("{}", message);
        match self.context.step.as_mut().filter(|step| !step.is_finished()) {
            Some(step) => {
                step.result.error_message.push_str(&message);
                step.result.error_message.push('\n');
            }
            None => debug!("No running step to attach script error to"),
        }
    }
}

impl<C: ResultChannel> EventSink for EventListener<C> {
    fn hear(&mut self, event: EngineEvent) -> RunnerResult<()> {
        self.handle(event)
    }
}

fn tags(payloads: Vec<TagPayload>) -> Vec<Tag> {
    payloads
        .into_iter()
        .map(|t| Tag {
            name: t.name,
            line: t.line,
        })
        .collect()
}
