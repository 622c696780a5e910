//! Per-scenario step statistics used by the summary-printing formatters

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ResultRecord;

/// Rolled-up state of one scenario
///
/// Only ever moves forward: `Passed → Incomplete → Failed` or `Passed → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioSummary {
    Passed,
    Incomplete,
    Failed,
}

/// Step counters for one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub count: u64,
    pub passed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub summary: ScenarioSummary,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            count: 0,
            passed: 0,
            skipped: 0,
            failed: 0,
            summary: ScenarioSummary::Passed,
        }
    }
}

impl RunStats {
    /// Fold one step result into the counters
    pub fn record(&mut self, result: &ResultRecord) {
        self.count += 1;
        if result.success {
            self.passed += 1;
        } else if result.skipped {
            self.skipped += 1;
            if self.summary == ScenarioSummary::Passed {
                self.summary = ScenarioSummary::Incomplete;
            }
        } else {
            self.failed += 1;
            self.summary = ScenarioSummary::Failed;
        }
    }
}

/// Scenario-level totals of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioTotals {
    pub count: u64,
    pub passed: u64,
    pub incomplete: u64,
    pub failed: u64,
}

/// Step-level totals of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTotals {
    pub count: u64,
    pub passed: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// All scenario stats of one formatter, keyed by scenario id
#[derive(Debug, Clone, Default)]
pub struct StatsBook {
    scenarios: HashMap<String, RunStats>,
}

impl StatsBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &ResultRecord) {
        self.scenarios
            .entry(result.scenario.id.clone())
            .or_default()
            .record(result);
    }

    pub fn get(&self, scenario_id: &str) -> Option<&RunStats> {
        self.scenarios.get(scenario_id)
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn totals(&self) -> (ScenarioTotals, StepTotals) {
        let mut scenarios = ScenarioTotals::default();
        let mut steps = StepTotals::default();
        for stats in self.scenarios.values() {
            scenarios.count += 1;
            match stats.summary {
                ScenarioSummary::Passed => scenarios.passed += 1,
                ScenarioSummary::Incomplete => scenarios.incomplete += 1,
                ScenarioSummary::Failed => scenarios.failed += 1,
            }
            steps.count += stats.count;
            steps.passed += stats.passed;
            steps.skipped += stats.skipped;
            steps.failed += stats.failed;
        }
        (scenarios, steps)
    }
}
