//! Run summary printed by the terminal formatters
//!
//! ```text
//! 2 Scenarios (1 passed, 0 incomplete, 1 failed)
//! 5 Steps (3 passed, 1 skipped, 1 failed)
//! 1.234 secs
//! ```

use std::time::Duration;

use colored::Colorize;
use cukebridge_common::StatsBook;

pub fn render(stats: &StatsBook, elapsed: Duration) -> String {
    let (scenarios, steps) = stats.totals();
    format!(
        "\n{} ({}, {}, {})\n{} ({}, {}, {})\n{}\n",
        plural(scenarios.count, "Scenario"),
        format!("{} passed", scenarios.passed).green(),
        format!("{} incomplete", scenarios.incomplete).cyan(),
        format!("{} failed", scenarios.failed).red(),
        plural(steps.count, "Step"),
        format!("{} passed", steps.passed).green(),
        format!("{} skipped", steps.skipped).cyan(),
        format!("{} failed", steps.failed).red(),
        format_interval(elapsed),
    )
}

fn plural(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// `"2 mins 3.5 secs"`, `"1 min 0 secs"`, `"0.25 secs"`
pub fn format_interval(elapsed: Duration) -> String {
    let millis = elapsed.as_millis() as u64;
    let mins = millis / 60_000;
    let secs = (millis % 60_000) as f64 / 1000.0;

    let mut text = String::new();
    if mins > 0 {
        text.push_str(&format!("{} {} ", mins, if mins == 1 { "min" } else { "mins" }));
    }
    text.push_str(&format!("{} {}", secs, if secs == 1.0 { "sec" } else { "secs" }));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use cukebridge_common::{Feature, ResultRecord, Scenario, Step, StepStatus};
    use test_case::test_case;

    #[test_case(250, "0.25 secs" ; "sub second")]
    #[test_case(1_000, "1 sec" ; "one second")]
    #[test_case(1_234, "1.234 secs" ; "fractional")]
    #[test_case(60_000, "1 min 0 secs" ; "one minute")]
    #[test_case(123_500, "2 mins 3.5 secs" ; "minutes")]
    fn test_format_interval(millis: u64, expected: &str) {
        assert_eq!(format_interval(Duration::from_millis(millis)), expected);
    }

    fn record(scenario: &str, status: StepStatus) -> ResultRecord {
        let feature = Feature::new("Login", "login.feature", "", 1, "Feature", vec![]);
        let scenario = Scenario::new(&feature.id, scenario, 3, "", vec![]);
        let mut step = Step::started("Given ", "x", 4, "steps.rs:1");
        step.result.status = Some(status);
        ResultRecord::new(feature, scenario, step)
    }

    #[test]
    fn test_render_counts() {
        colored::control::set_override(false);
        let mut stats = StatsBook::new();
        stats.record(&record("One", StepStatus::Passed));
        stats.record(&record("One", StepStatus::Passed));
        stats.record(&record("Two", StepStatus::Failed));
        stats.record(&record("Two", StepStatus::Skipped));

        let text = render(&stats, Duration::from_millis(1_500));
        assert_eq!(
            text,
            "\n2 Scenarios (1 passed, 0 incomplete, 1 failed)\n\
             4 Steps (2 passed, 1 skipped, 1 failed)\n\
             1.5 secs\n"
        );
    }

    #[test]
    fn test_render_singular() {
        colored::control::set_override(false);
        let mut stats = StatsBook::new();
        stats.record(&record("One", StepStatus::Undefined));
        let text = render(&stats, Duration::ZERO);
        assert!(text.contains("1 Scenario (0 passed, 1 incomplete, 0 failed)"));
        assert!(text.contains("1 Step (0 passed, 1 skipped, 0 failed)"));
        assert!(text.ends_with("0 secs\n"));
    }
}
