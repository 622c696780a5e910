//! Typed contract with the external Gherkin engine
//!
//! The engine walks parsed features and announces its progress as an ordered
//! stream of [`EngineEvent`]s. Each event carries an explicit payload struct;
//! decoding an event from the wire validates its shape once, at the boundary,
//! so the listener never deals with missing accessors.

use async_trait::async_trait;
use cukebridge_common::{EngineOptions, StepStatus};
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;
use crate::support::SupportCode;

/// Uri an engine reports for step definitions it cannot locate
pub const UNKNOWN_URI: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPayload {
    pub name: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePayload {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub description: String,
    pub line: u32,
    #[serde(default = "default_feature_keyword")]
    pub keyword: String,
    #[serde(default)]
    pub tags: Vec<TagPayload>,
}

fn default_feature_keyword() -> String {
    "Feature".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPayload {
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<TagPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPayload {
    /// Keyword including its trailing space, e.g. `"Given "`
    pub keyword: String,
    pub name: String,
    pub line: u32,
    /// Feature file the step is declared in
    pub uri: String,
}

impl StepPayload {
    /// Before/After hooks run as steps but are never reported
    pub fn is_hook(&self) -> bool {
        self.keyword.starts_with("Before") || self.keyword.starts_with("After")
    }

    pub fn location(&self) -> String {
        format!("{}:{}", self.uri, self.line)
    }
}

/// Source location of the step definition that matched a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinitionRef {
    pub uri: String,
    pub line: u32,
}

impl StepDefinitionRef {
    pub fn location(&self) -> Option<String> {
        (self.uri != UNKNOWN_URI).then(|| format!("{}:{}", self.uri, self.line))
    }
}

/// What a failing step threw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureException {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
}

impl FailureException {
    /// The stack when there is one, the bare message otherwise
    pub fn text(&self) -> &str {
        self.stack.as_deref().unwrap_or(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResultPayload {
    pub status: StepStatus,
    /// Nanoseconds; engines omit it for steps that never ran
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub failure: Option<FailureException>,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
    #[serde(default)]
    pub step_definition: Option<StepDefinitionRef>,
    pub step: StepPayload,
}

/// An uncaught script error raised by the page under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptError {
    pub message: String,
    pub source: String,
    pub line: u32,
    pub column: u32,
}

/// One lifecycle event of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    RunStarted,
    FeatureStarted(FeaturePayload),
    ScenarioStarted(ScenarioPayload),
    StepStarted(StepPayload),
    StepFinished(StepResultPayload),
    RunFinished,
    ScriptError(ScriptError),
}

impl EngineEvent {
    /// Decode and validate one event from its JSON form
    pub fn decode(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::RunStarted => "run_started",
            EngineEvent::FeatureStarted(_) => "feature_started",
            EngineEvent::ScenarioStarted(_) => "scenario_started",
            EngineEvent::StepStarted(_) => "step_started",
            EngineEvent::StepFinished(_) => "step_finished",
            EngineEvent::RunFinished => "run_finished",
            EngineEvent::ScriptError(_) => "script_error",
        }
    }
}

/// Consumer of the engine's event stream
pub trait EventSink: Send {
    fn hear(&mut self, event: EngineEvent) -> RunnerResult<()>;
}

/// A feature file as handed to the engine: location and full text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSource {
    pub path: String,
    pub text: String,
}

/// What the engine hands back when it is done
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineReport {
    /// Code coverage collected from the page under test, if instrumented
    pub coverage: Option<serde_json::Value>,
}

/// The Gherkin engine itself
///
/// Implementations parse and walk `features`, run steps against `support`,
/// and report every lifecycle transition to `sink` in order, one step at a
/// time.
#[async_trait]
pub trait TestEngine: Send {
    async fn run(
        &mut self,
        features: Vec<FeatureSource>,
        support: SupportCode,
        options: EngineOptions,
        sink: &mut dyn EventSink,
    ) -> RunnerResult<EngineReport>;
}
