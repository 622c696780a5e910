//! Support code: step definitions, hooks and the World they run against
//!
//! Step-definition modules are plain functions registered, in order, with a
//! [`SupportCodeLoader`]. Before the engine starts, the loader invokes each
//! module once against a shared [`SupportCode`] context, which is where the
//! modules register their steps and hooks.

use std::panic::Location;
use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error};

use crate::engine::StepDefinitionRef;
use crate::error::PageError;
use crate::page::{PageConfig, PageController};

/// Why a step did not pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    #[error("{0}")]
    Assertion(String),

    #[error("{0}")]
    Page(String),

    #[error("Step is pending")]
    Pending,
}

impl From<PageError> for StepFailure {
    fn from(e: PageError) -> Self {
        StepFailure::Page(e.to_string())
    }
}

pub type StepResult = Result<(), StepFailure>;

pub type StepFuture<'a> = BoxFuture<'a, StepResult>;

type StepFn = Arc<dyn for<'a> Fn(&'a mut World, Vec<String>) -> StepFuture<'a> + Send + Sync>;

type HookFn = Arc<dyn for<'a> Fn(&'a mut World) -> StepFuture<'a> + Send + Sync>;

/// Builds a fresh World for every scenario
pub type WorldFactory = Arc<dyn Fn() -> World + Send + Sync>;

/// Per-scenario execution context handed to every step
pub struct World {
    pub browser: PageController,
}

impl World {
    pub fn new(browser: PageController) -> Self {
        Self { browser }
    }

    /// Shortcut for `browser.navigate`
    pub async fn visit(&mut self, path: &str) -> Result<(), PageError> {
        self.browser.navigate(path).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKeyword {
    Given,
    When,
    Then,
}

/// A registered step phrase
pub struct StepDefinition {
    pub keyword: StepKeyword,
    pub pattern: Regex,
    pub uri: String,
    pub line: u32,
    handler: StepFn,
}

impl StepDefinition {
    /// Source location in the shape engines report it
    pub fn reference(&self) -> StepDefinitionRef {
        StepDefinitionRef {
            uri: self.uri.clone(),
            line: self.line,
        }
    }

    /// Capture groups when `text` matches the whole pattern
    pub fn arguments(&self, text: &str) -> Option<Vec<String>> {
        self.pattern.captures(text).map(|captures| {
            captures
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect()
        })
    }

    pub async fn invoke(&self, world: &mut World, arguments: Vec<String>) -> StepResult {
        (self.handler)(world, arguments).await
    }
}

/// Outcome of looking up the definition for a step text
pub enum StepLookup<'a> {
    Matched {
        definition: &'a StepDefinition,
        arguments: Vec<String>,
    },
    Undefined,
    Ambiguous(Vec<&'a StepDefinition>),
}

/// A Before or After hook
pub struct Hook {
    pub uri: String,
    pub line: u32,
    handler: HookFn,
}

impl Hook {
    pub async fn invoke(&self, world: &mut World) -> StepResult {
        (self.handler)(world).await
    }
}

/// Registration context shared by all support modules
pub struct SupportCode {
    definitions: Vec<StepDefinition>,
    before: Vec<Hook>,
    after: Vec<Hook>,
    world: WorldFactory,
}

impl SupportCode {
    /// Context whose default World drives an HTTP page with `page` settings
    pub fn new(page: PageConfig) -> Self {
        Self {
            definitions: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            world: Arc::new(move || World::new(PageController::http(page.clone()))),
        }
    }

    #[track_caller]
    pub fn given<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World, Vec<String>) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.define(StepKeyword::Given, pattern, Arc::new(handler), Location::caller())
    }

    #[track_caller]
    pub fn when<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World, Vec<String>) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.define(StepKeyword::When, pattern, Arc::new(handler), Location::caller())
    }

    #[track_caller]
    pub fn then<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World, Vec<String>) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.define(StepKeyword::Then, pattern, Arc::new(handler), Location::caller())
    }

    #[track_caller]
    pub fn before<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World) -> StepFuture<'a> + Send + Sync + 'static,
    {
        let caller = Location::caller();
        self.before.push(Hook {
            uri: caller.file().to_string(),
            line: caller.line(),
            handler: Arc::new(handler),
        });
        self
    }

    #[track_caller]
    pub fn after<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World) -> StepFuture<'a> + Send + Sync + 'static,
    {
        let caller = Location::caller();
        self.after.push(Hook {
            uri: caller.file().to_string(),
            line: caller.line(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Replace how Worlds are built
    pub fn set_world<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> World + Send + Sync + 'static,
    {
        self.world = Arc::new(factory);
        self
    }

    pub fn build_world(&self) -> World {
        (self.world)()
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    pub fn before_hooks(&self) -> &[Hook] {
        &self.before
    }

    pub fn after_hooks(&self) -> &[Hook] {
        &self.after
    }

    /// Find the single definition matching `text`
    pub fn find_match(&self, text: &str) -> StepLookup<'_> {
        let mut matches: Vec<(&StepDefinition, Vec<String>)> = self
            .definitions
            .iter()
            .filter_map(|d| d.arguments(text).map(|args| (d, args)))
            .collect();
        match matches.len() {
            0 => StepLookup::Undefined,
            1 => {
                let (definition, arguments) = matches.remove(0);
                StepLookup::Matched {
                    definition,
                    arguments,
                }
            }
            _ => StepLookup::Ambiguous(matches.into_iter().map(|(d, _)| d).collect()),
        }
    }

    fn define(
        &mut self,
        keyword: StepKeyword,
        pattern: &str,
        handler: StepFn,
        caller: &'static Location<'static>,
    ) -> &mut Self {
        let anchored = anchor(pattern);
        match Regex::new(&anchored) {
            Ok(pattern) => self.definitions.push(StepDefinition {
                keyword,
                pattern,
                uri: caller.file().to_string(),
                line: caller.line(),
                handler,
            }),
            Err(e) => error!(
                "Ignoring step definition at {}:{} with invalid pattern '{}': {}",
                caller.file(),
                caller.line(),
                pattern,
                e
            ),
        }
        self
    }
}

/// Step phrases always match the whole step text
fn anchor(pattern: &str) -> String {
    let start = if pattern.starts_with('^') { "" } else { "^" };
    let end = if pattern.ends_with('$') { "" } else { "$" };
    format!("{}{}{}", start, pattern, end)
}

/// A support module registers steps and hooks on the shared context
pub type SupportModule = Box<dyn Fn(&mut SupportCode) + Send + Sync>;

/// Anything a support file exports; only modules are invoked
pub enum SupportExport {
    Module(SupportModule),
    Value(serde_json::Value),
}

/// Ordered collection of support exports
#[derive(Default)]
pub struct SupportCodeLoader {
    exports: Vec<SupportExport>,
}

impl SupportCodeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a support module
    pub fn register<F>(&mut self, module: F) -> &mut Self
    where
        F: Fn(&mut SupportCode) + Send + Sync + 'static,
    {
        self.exports.push(SupportExport::Module(Box::new(module)));
        self
    }

    /// Register any export, module or not
    pub fn export(&mut self, export: SupportExport) -> &mut Self {
        self.exports.push(export);
        self
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Invoke every module once, in registration order
    pub fn load(&self, support: &mut SupportCode) {
        for (index, export) in self.exports.iter().enumerate() {
            match export {
                SupportExport::Module(module) => module(support),
                SupportExport::Value(_) => debug!("Skipping non-module support export #{}", index),
            }
        }
        debug!(
            "Loaded {} step definitions, {} before hooks, {} after hooks",
            support.definitions.len(),
            support.before.len(),
            support.after.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    async fn noop(_world: &mut World, _args: Vec<String>) -> StepResult {
        Ok(())
    }

    async fn fail_with_first(_world: &mut World, args: Vec<String>) -> StepResult {
        Err(StepFailure::Assertion(args.into_iter().next().unwrap_or_default()))
    }

    fn support() -> SupportCode {
        SupportCode::new(PageConfig::default())
    }

    #[test]
    fn test_loader_invokes_modules_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut loader = SupportCodeLoader::new();
        let first = calls.clone();
        loader.register(move |_| first.lock().unwrap().push("first"));
        loader.export(SupportExport::Value(serde_json::json!({"not": "a module"})));
        let second = calls.clone();
        loader.register(move |_| second.lock().unwrap().push("second"));

        loader.load(&mut support());
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(loader.len(), 3);
    }

    #[test]
    fn test_modules_register_on_shared_context() {
        let mut loader = SupportCodeLoader::new();
        loader.register(|support| {
            support.given("I am on the login page", |w, a| Box::pin(noop(w, a)));
        });
        loader.register(|support| {
            support.then(r#"I see "([^"]*)""#, |w, a| Box::pin(fail_with_first(w, a)));
            support.before(|_| Box::pin(async { Ok(()) }));
        });

        let mut support = support();
        loader.load(&mut support);
        assert_eq!(support.definitions().len(), 2);
        assert_eq!(support.before_hooks().len(), 1);
        assert!(support.definitions()[0].uri.ends_with("support.rs"));
        assert_eq!(support.definitions()[1].keyword, StepKeyword::Then);
    }

    #[test]
    fn test_find_match() {
        let mut support = support();
        support.when(r#"I go to "([^"]*)""#, |w, a| Box::pin(noop(w, a)));
        support.when(r#"I go to "/home""#, |w, a| Box::pin(noop(w, a)));

        match support.find_match(r#"I go to "/login""#) {
            StepLookup::Matched { arguments, .. } => assert_eq!(arguments, vec!["/login"]),
            _ => panic!("expected a match"),
        }
        assert!(matches!(support.find_match("nothing here"), StepLookup::Undefined));
        assert!(matches!(
            support.find_match(r#"I go to "/home""#),
            StepLookup::Ambiguous(ref found) if found.len() == 2
        ));
        // Anchored: a longer text does not match
        assert!(matches!(
            support.find_match(r#"I go to "/login" twice"#),
            StepLookup::Undefined
        ));
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let mut support = support();
        support.given("broken (", |w, a| Box::pin(noop(w, a)));
        assert!(support.definitions().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_definition() {
        let mut support = support();
        support.then(r#"I see "([^"]*)""#, |w, a| Box::pin(fail_with_first(w, a)));
        let mut world = support.build_world();

        let StepLookup::Matched { definition, arguments } = support.find_match(r#"I see "it""#) else {
            panic!("expected a match");
        };
        let result = definition.invoke(&mut world, arguments).await;
        assert_eq!(result, Err(StepFailure::Assertion("it".to_string())));
        assert_eq!(definition.reference().line, definition.line);
    }
}
