//! Engine events through the listener into per-scenario statistics

use cukebridge_common::{ChannelMessage, MemoryChannel, ScenarioSummary, StatsBook, StepStatus};
use cukebridge_runner::engine::{
    FailureException, FeaturePayload, ScenarioPayload, StepDefinitionRef, StepPayload,
    StepResultPayload,
};
use cukebridge_runner::{EngineEvent, EventListener};

fn feature(name: &str) -> EngineEvent {
    EngineEvent::FeatureStarted(FeaturePayload {
        name: name.to_string(),
        uri: format!("http://localhost:9876/base/features/{}.feature", name.to_lowercase()),
        description: String::new(),
        line: 1,
        keyword: "Feature".to_string(),
        tags: vec![],
    })
}

fn scenario(name: &str, line: u32) -> EngineEvent {
    EngineEvent::ScenarioStarted(ScenarioPayload {
        name: name.to_string(),
        line,
        description: String::new(),
        tags: vec![],
    })
}

fn step(keyword: &str, name: &str, line: u32) -> StepPayload {
    StepPayload {
        keyword: keyword.to_string(),
        name: name.to_string(),
        line,
        uri: "http://localhost:9876/base/features/login.feature?abc123".to_string(),
    }
}

fn finished(step: StepPayload, status: StepStatus) -> EngineEvent {
    EngineEvent::StepFinished(StepResultPayload {
        status,
        duration: Some(1_500_000),
        failure: None,
        attachments: vec![],
        step_definition: Some(StepDefinitionRef {
            uri: "http://localhost:9876/absolute/work/steps/login_steps.rs?v=2".to_string(),
            line: 12,
        }),
        step,
    })
}

fn run_step(listener: &mut EventListener<MemoryChannel>, keyword: &str, name: &str, line: u32, status: StepStatus) {
    let payload = step(keyword, name, line);
    listener.handle(EngineEvent::StepStarted(payload.clone())).unwrap();
    listener.handle(finished(payload, status)).unwrap();
}

fn stats(channel: &MemoryChannel) -> StatsBook {
    let mut book = StatsBook::default();
    for record in channel.results() {
        book.record(record);
    }
    book
}

#[test]
fn test_login_scenario_end_to_end() {
    let mut listener = EventListener::new(MemoryChannel::default());
    listener.handle(EngineEvent::RunStarted).unwrap();
    listener.handle(feature("Login")).unwrap();
    listener.handle(scenario("Valid credentials", 3)).unwrap();
    run_step(&mut listener, "Before ", "", 0, StepStatus::Passed);
    run_step(&mut listener, "Given ", "I am on the login page", 4, StepStatus::Passed);
    run_step(&mut listener, "Then ", "I am logged in", 5, StepStatus::Passed);
    run_step(&mut listener, "After ", "", 0, StepStatus::Passed);
    listener.handle(EngineEvent::RunFinished).unwrap();

    let channel = listener.into_channel();
    let records: Vec<_> = channel.results().collect();
    assert_eq!(records.len(), 2);

    let first = records[0];
    assert_eq!(first.feature.uri, "features/login.feature");
    assert_eq!(first.scenario.id, "login;valid-credentials");
    assert_eq!(first.step.step_match.location, "/work/steps/login_steps.rs:12");
    assert_eq!(first.step.result.duration, 1_500_000);
    assert!(first.success);
    assert!(!first.skipped);

    let progress: Vec<u64> = channel
        .messages
        .iter()
        .filter_map(|m| match m {
            ChannelMessage::Info(info) => Some(info.total),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![1, 2]);

    let book = stats(&channel);
    let login = book.get("login;valid-credentials").unwrap();
    assert_eq!(login.count, 2);
    assert_eq!(login.passed, 2);
    assert_eq!(login.skipped, 0);
    assert_eq!(login.failed, 0);
    assert_eq!(login.summary, ScenarioSummary::Passed);
}

#[test]
fn test_summary_escalation_across_scenarios() {
    let mut listener = EventListener::new(MemoryChannel::default());
    listener.handle(EngineEvent::RunStarted).unwrap();
    listener.handle(feature("Checkout")).unwrap();

    listener.handle(scenario("Missing step", 3)).unwrap();
    run_step(&mut listener, "Given ", "a cart", 4, StepStatus::Passed);
    run_step(&mut listener, "When ", "I do something new", 5, StepStatus::Undefined);
    run_step(&mut listener, "Then ", "it works", 6, StepStatus::Skipped);

    listener.handle(scenario("Broken payment", 8)).unwrap();
    run_step(&mut listener, "Given ", "a cart", 9, StepStatus::Pending);
    run_step(&mut listener, "When ", "I pay", 10, StepStatus::Failed);
    run_step(&mut listener, "Then ", "I get a receipt", 11, StepStatus::Skipped);
    listener.handle(EngineEvent::RunFinished).unwrap();

    let book = stats(listener.channel());
    let missing = book.get("checkout;missing-step").unwrap();
    assert_eq!((missing.count, missing.passed, missing.skipped), (3, 1, 2));
    assert_eq!(missing.summary, ScenarioSummary::Incomplete);

    let broken = book.get("checkout;broken-payment").unwrap();
    assert_eq!((broken.failed, broken.skipped), (1, 2));
    assert_eq!(broken.summary, ScenarioSummary::Failed);

    let (scenarios, steps) = book.totals();
    assert_eq!(scenarios.count, 2);
    assert_eq!(scenarios.incomplete, 1);
    assert_eq!(scenarios.failed, 1);
    assert_eq!(steps.count, 6);
}

#[test]
fn test_failed_step_carries_sanitized_stack() {
    let mut listener = EventListener::new(MemoryChannel::default());
    listener.handle(feature("Login")).unwrap();
    listener.handle(scenario("Bad password", 7)).unwrap();

    let payload = step("Then ", "I see an error", 9);
    listener.handle(EngineEvent::StepStarted(payload.clone())).unwrap();
    listener
        .handle(EngineEvent::StepFinished(StepResultPayload {
            status: StepStatus::Failed,
            duration: None,
            failure: Some(FailureException {
                message: "expected error".to_string(),
                stack: Some(
                    "Error: expected error\n\
                     at http://localhost:9876/base/steps/login.js?deadbeef:14:3\n\
                     at http://localhost:9876/base/node_modules/cucumber/release/cucumber.js?1:100:2\n"
                        .to_string(),
                ),
            }),
            attachments: vec![],
            step_definition: None,
            step: payload,
        }))
        .unwrap();

    let record = listener.channel().results().next().cloned().unwrap();
    assert!(!record.success);
    assert!(!record.skipped);
    assert_eq!(record.step.step_match.location, "features/login.feature:9");
    let message = &record.step.result.error_message;
    assert!(message.starts_with("Error: expected error"));
    assert!(message.contains("steps/login.js:14:3"));
    assert!(!message.contains("cucumber.js"));
    assert!(!message.contains("deadbeef"));
    assert!(!message.ends_with('\n'));
}
