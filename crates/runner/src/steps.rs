//! Built-in browser step phrases
//!
//! Register with `loader.register(browser_steps)`.

use regex::Regex;

use crate::support::{StepFailure, StepResult, SupportCode, World};

pub fn browser_steps(support: &mut SupportCode) {
    support
        .when(r#"I go to "([^"]*)""#, |world, args| Box::pin(go_to(world, args)))
        .then(r#"I should see "([^"]*)" in the "([^"]*)" element"#, |world, args| {
            Box::pin(should_see_in_element(world, args))
        })
        .then(r#"the "([^"]*)" element should be "([^"]*)""#, |world, args| {
            Box::pin(element_should_be(world, args))
        })
        .then(r#"the response code should be "(\d+)""#, |world, args| {
            Box::pin(response_code_should_be(world, args))
        })
        .then(r#"the response header "([^"]*)" should match "([^"]*)""#, |world, args| {
            Box::pin(response_header_should_match(world, args))
        });
}

fn argument(args: &[String], index: usize) -> Result<&str, StepFailure> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| StepFailure::Assertion(format!("missing step argument #{}", index + 1)))
}

async fn go_to(world: &mut World, args: Vec<String>) -> StepResult {
    world.visit(argument(&args, 0)?).await?;
    Ok(())
}

async fn should_see_in_element(world: &mut World, args: Vec<String>) -> StepResult {
    let html = argument(&args, 0)?;
    let element = argument(&args, 1)?;
    let nodes = world.browser.query(&format!("html {}", element))?;
    let haystack = nodes.first().map(|node| node.inner_html.as_str()).unwrap_or_default();
    if haystack.contains(html) {
        Ok(())
    } else {
        Err(StepFailure::Assertion(format!(
            "Expected \"{}\" in the \"{}\" element",
            html, element
        )))
    }
}

async fn element_should_be(world: &mut World, args: Vec<String>) -> StepResult {
    let element = argument(&args, 0)?;
    let expected = argument(&args, 1)?;
    let nodes = world.browser.query(&format!("html {}", element))?;
    let actual = nodes.first().map(|node| node.inner_html.as_str()).unwrap_or_default();
    if actual == expected {
        Ok(())
    } else {
        Err(StepFailure::Assertion(format!(
            "Element \"{}\" should be \"{}\" (was \"{}\")",
            element, expected, actual
        )))
    }
}

async fn response_code_should_be(world: &mut World, args: Vec<String>) -> StepResult {
    let expected = argument(&args, 0)?;
    let actual = world.browser.status_code().await?;
    if actual.to_string() == expected {
        Ok(())
    } else {
        Err(StepFailure::Assertion(format!(
            "Code should be \"{}\" (was \"{}\")",
            expected, actual
        )))
    }
}

async fn response_header_should_match(world: &mut World, args: Vec<String>) -> StepResult {
    let name = argument(&args, 0)?;
    let pattern = argument(&args, 1)?;
    let matcher = Regex::new(pattern)
        .map_err(|e| StepFailure::Assertion(format!("Invalid header pattern \"{}\": {}", pattern, e)))?;
    let actual = world.browser.response_header(name).await?.unwrap_or_default();
    if matcher.is_match(&actual) {
        Ok(())
    } else {
        Err(StepFailure::Assertion(format!(
            "Header \"{}\" should match \"{}\" (was \"{}\")",
            name, pattern, actual
        )))
    }
}
