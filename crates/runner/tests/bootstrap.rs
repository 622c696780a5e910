//! Bootstrap from feature files on disk to the completion signal

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cukebridge_common::{EngineOptions, MemoryChannel, StepStatus};
use cukebridge_runner::engine::{
    FailureException, FeaturePayload, ScenarioPayload, StepPayload, StepResultPayload,
};
use cukebridge_runner::{
    discover_features, EngineEvent, EngineReport, EventSink, FeatureSource, PageConfig, Runner,
    RunnerConfig, RunnerResult, StepFailure, StepLookup, SupportCode, SupportCodeLoader,
    SupportExport, TestEngine,
};

/// Just enough Gherkin: `Feature:`, `Scenario:` and keyword steps
#[derive(Default)]
struct LineEngine {
    seen: Arc<Mutex<Vec<String>>>,
    options: Arc<Mutex<Option<EngineOptions>>>,
}

#[async_trait]
impl TestEngine for LineEngine {
    async fn run(
        &mut self,
        features: Vec<FeatureSource>,
        support: SupportCode,
        options: EngineOptions,
        sink: &mut dyn EventSink,
    ) -> RunnerResult<EngineReport> {
        *self.options.lock().unwrap() = Some(options);
        sink.hear(EngineEvent::RunStarted)?;
        for feature in features {
            self.seen.lock().unwrap().push(feature.path.clone());
            let mut world = support.build_world();
            for (index, line) in feature.text.lines().enumerate() {
                let line_number = index as u32 + 1;
                let line = line.trim();
                if let Some(name) = line.strip_prefix("Feature:") {
                    sink.hear(EngineEvent::FeatureStarted(FeaturePayload {
                        name: name.trim().to_string(),
                        uri: feature.path.clone(),
                        description: String::new(),
                        line: line_number,
                        keyword: "Feature".to_string(),
                        tags: vec![],
                    }))?;
                } else if let Some(name) = line.strip_prefix("Scenario:") {
                    sink.hear(EngineEvent::ScenarioStarted(ScenarioPayload {
                        name: name.trim().to_string(),
                        line: line_number,
                        description: String::new(),
                        tags: vec![],
                    }))?;
                } else if let Some((keyword, text)) = line.split_once(' ') {
                    let step = StepPayload {
                        keyword: format!("{} ", keyword),
                        name: text.to_string(),
                        line: line_number,
                        uri: feature.path.clone(),
                    };
                    sink.hear(EngineEvent::StepStarted(step.clone()))?;
                    let (status, failure, step_definition) = match support.find_match(text) {
                        StepLookup::Matched {
                            definition,
                            arguments,
                        } => match definition.invoke(&mut world, arguments).await {
                            Ok(()) => (StepStatus::Passed, None, Some(definition.reference())),
                            Err(StepFailure::Pending) => {
                                (StepStatus::Pending, None, Some(definition.reference()))
                            }
                            Err(e) => (
                                StepStatus::Failed,
                                Some(FailureException {
                                    message: e.to_string(),
                                    stack: None,
                                }),
                                Some(definition.reference()),
                            ),
                        },
                        StepLookup::Undefined => (StepStatus::Undefined, None, None),
                        StepLookup::Ambiguous(_) => (StepStatus::Ambiguous, None, None),
                    };
                    sink.hear(EngineEvent::StepFinished(StepResultPayload {
                        status,
                        duration: Some(1_000),
                        failure,
                        attachments: vec![],
                        step_definition,
                        step,
                    }))?;
                }
            }
        }
        sink.hear(EngineEvent::RunFinished)?;
        Ok(EngineReport {
            coverage: Some(serde_json::json!({"lines": 3})),
        })
    }
}

fn write_features(dir: &std::path::Path) {
    std::fs::write(
        dir.join("b_checkout.feature"),
        "Feature: Checkout\n\n  Scenario: Pay\n    Given a cart\n    When I pay\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("a_login.feature"),
        "Feature: Login\n\n  Scenario: Valid credentials\n    Given a user \"ann\"\n    Then ann is logged in\n",
    )
    .unwrap();
    std::fs::write(dir.join("steps.txt"), "not a feature").unwrap();
}

fn loader() -> SupportCodeLoader {
    let mut loader = SupportCodeLoader::new();
    loader.register(|support| {
        support.given(r#"a user "(\w+)""#, |_, _| Box::pin(async { Ok(()) }));
        support.then("ann is logged in", |_, _| Box::pin(async { Ok(()) }));
        support.given("a cart", |_, _| Box::pin(async { Ok(()) }));
    });
    loader.export(SupportExport::Value(serde_json::json!("ignored")));
    loader.register(|support| {
        support.when("I pay", |_, _| {
            Box::pin(async { Err(StepFailure::Assertion("card declined".to_string())) })
        });
    });
    loader
}

#[tokio::test]
async fn test_runner_walks_features_in_order_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    write_features(dir.path());
    let root = dir.path().to_string_lossy().to_string();

    let engine = LineEngine::default();
    let seen = engine.seen.clone();
    let options = engine.options.clone();

    let mut runner = Runner::new(
        engine,
        loader(),
        RunnerConfig {
            files: discover_features(&[root]),
            args: vec!["--tags".into(), "@smoke".into(), "--strict".into()],
            page: PageConfig::default(),
        },
    );
    let channel = runner.start(MemoryChannel::default()).await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].ends_with("a_login.feature"));
    assert!(seen[1].ends_with("b_checkout.feature"));

    let options = options.lock().unwrap().clone().unwrap();
    assert_eq!(options.get("tags"), ["@smoke"]);
    assert!(options.contains("strict"));
    assert!(options.get("strict").is_empty());

    let records: Vec<_> = channel.results().collect();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].scenario.id, "login;valid-credentials");
    assert!(records[0].step.step_match.location.contains("bootstrap.rs:"));
    assert!(records.iter().take(3).all(|r| r.success));

    let declined = records[3];
    assert_eq!(declined.step.result.status, Some(StepStatus::Failed));
    assert_eq!(declined.step.result.error_message, "card declined");

    let completion = channel.completion().unwrap();
    assert_eq!(completion.coverage, Some(serde_json::json!({"lines": 3})));
}
