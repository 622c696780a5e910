//! Normalized result model shipped from the browser side to report formatters
//!
//! Every type here is plain data: it is built by the event listener, cloned
//! into a [`ResultRecord`] and serialized across the browser/host boundary.
//! Field names follow the Cucumber JSON report layout so the JSON formatter
//! can dump them unchanged.

use serde::{Deserialize, Serialize};

use crate::attachment::Embedding;
use crate::sanitize::slugify;

/// A tag attached to a feature or scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub line: u32,
}

/// The feature currently being walked by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Slugified feature name
    pub id: String,

    /// Feature file location with the test-server prefix removed
    pub uri: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub line: u32,

    pub keyword: String,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Feature {
    /// Build a feature; `uri` is expected to be sanitized already
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        description: impl Into<String>,
        line: u32,
        keyword: impl Into<String>,
        tags: Vec<Tag>,
    ) -> Self {
        let name = name.into();
        Self {
            id: slugify(&name),
            uri: uri.into(),
            name,
            description: description.into(),
            line,
            keyword: keyword.into(),
            tags,
        }
    }
}

/// The scenario currently being walked by the engine
///
/// Outline rows are expanded into individual scenarios before they reach the
/// listener, so `examples` is always empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// `<feature id>;<slugified scenario name>`
    pub id: String,

    pub name: String,

    pub line: u32,

    pub keyword: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub examples: Vec<serde_json::Value>,
}

impl Scenario {
    pub fn new(
        feature_id: &str,
        name: impl Into<String>,
        line: u32,
        description: impl Into<String>,
        tags: Vec<Tag>,
    ) -> Self {
        let name = name.into();
        Self {
            id: scenario_id(feature_id, &name),
            name,
            line,
            keyword: "Scenario".to_string(),
            description: description.into(),
            kind: "scenario".to_string(),
            tags,
            examples: Vec::new(),
        }
    }
}

/// Scenario identity: same feature and same name always collide
pub fn scenario_id(feature_id: &str, scenario_name: &str) -> String {
    format!("{};{}", feature_id, slugify(scenario_name))
}

/// Outcome of a single step as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
    Pending,
    Undefined,
    Ambiguous,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::Pending => "pending",
            StepStatus::Undefined => "undefined",
            StepStatus::Ambiguous => "ambiguous",
        }
    }

    /// Counts as a success for the host harness
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Passed)
    }

    /// Counts as skipped for the host harness; never true together with
    /// [`StepStatus::is_success`]
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            StepStatus::Skipped | StepStatus::Pending | StepStatus::Undefined | StepStatus::Ambiguous
        )
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(StepStatus::Passed),
            "failed" => Ok(StepStatus::Failed),
            "skipped" => Ok(StepStatus::Skipped),
            "pending" => Ok(StepStatus::Pending),
            "undefined" => Ok(StepStatus::Undefined),
            "ambiguous" => Ok(StepStatus::Ambiguous),
            other => Err(crate::Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Where the code behind a step lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMatch {
    pub location: String,
}

/// Result block of a step; `status` stays `None` until the step finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub status: Option<StepStatus>,

    #[serde(default)]
    pub error_message: String,

    /// Engine-reported duration in nanoseconds
    #[serde(default)]
    pub duration: u64,
}

/// A single Gherkin step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub keyword: String,

    pub name: String,

    pub line: u32,

    #[serde(rename = "match")]
    pub step_match: StepMatch,

    pub result: StepOutcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Embedding>>,
}

impl Step {
    /// A freshly started step pointing at its own declaration
    pub fn started(
        keyword: impl Into<String>,
        name: impl Into<String>,
        line: u32,
        location: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            name: name.into(),
            line,
            step_match: StepMatch {
                location: location.into(),
            },
            result: StepOutcome {
                status: None,
                error_message: String::new(),
                duration: 0,
            },
            embeddings: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.result.status.is_some()
    }
}

/// One completed, non-hook step as delivered to the report formatters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub feature: Feature,

    pub scenario: Scenario,

    pub step: Step,

    /// `["<feature name>: <scenario name>"]`
    pub suite: Vec<String>,

    /// Step keyword followed by step name
    pub description: String,

    #[serde(default)]
    pub log: Vec<String>,

    /// Step duration in seconds
    pub time: f64,

    pub success: bool,

    pub skipped: bool,
}

impl ResultRecord {
    /// Assemble a record from the active contexts of a finished step
    pub fn new(feature: Feature, scenario: Scenario, step: Step) -> Self {
        let status = step.result.status;
        let suite = vec![format!("{}: {}", feature.name, scenario.name)];
        let description = format!("{}{}", step.keyword, step.name);
        let time = step.result.duration as f64 / 1_000_000_000.0;
        Self {
            feature,
            scenario,
            step,
            suite,
            description,
            log: Vec::new(),
            time,
            success: status.map(|s| s.is_success()).unwrap_or(false),
            skipped: status.map(|s| s.is_skipped()).unwrap_or(false),
        }
    }

    pub fn status(&self) -> Option<StepStatus> {
        self.step.result.status
    }
}

/// Step-count progress sent to the host after every reported step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub total: u64,
}

/// Completion signal sent to the host once the engine is done
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub coverage: Option<serde_json::Value>,
}
