//! Bootstrap: loads features, starts the engine and forwards completion

use std::path::Path;

use cukebridge_common::{CompletionPayload, EngineOptions, ResultChannel};
use tracing::{debug, info, warn};

use crate::engine::{FeatureSource, TestEngine};
use crate::error::{RunnerError, RunnerResult};
use crate::listener::EventListener;
use crate::page::PageConfig;
use crate::support::{SupportCode, SupportCodeLoader};

const FEATURE_EXTENSION: &str = ".feature";

/// Configuration for a run
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Served files; only `*.feature` entries are loaded, in this order
    pub files: Vec<String>,
    /// CLI-style engine arguments, e.g. `--tags @smoke`
    pub args: Vec<String>,
    /// Settings for every World's page controller
    pub page: PageConfig,
}

/// Wires support code, engine and listener together for one run
pub struct Runner<E: TestEngine> {
    engine: E,
    loader: SupportCodeLoader,
    config: RunnerConfig,
    client: reqwest::Client,
}

impl<E: TestEngine> Runner<E> {
    pub fn new(engine: E, loader: SupportCodeLoader, config: RunnerConfig) -> Self {
        Self {
            engine,
            loader,
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Feature files among the configured files, in configured order
    pub fn feature_files(&self) -> Vec<&str> {
        self.config
            .files
            .iter()
            .map(String::as_str)
            .filter(|path| is_feature(path))
            .collect()
    }

    /// Fetch every feature's text one after the other
    ///
    /// Loads never overlap so the engine sees features in discovery order.
    pub async fn load_features(&self) -> RunnerResult<Vec<FeatureSource>> {
        let mut features = Vec::new();
        for path in self.feature_files() {
            let text = self.fetch(path).await?;
            debug!("Loaded feature {} ({} bytes)", path, text.len());
            features.push(FeatureSource {
                path: path.to_string(),
                text,
            });
        }
        Ok(features)
    }

    pub fn options(&self) -> EngineOptions {
        EngineOptions::parse(&self.config.args)
    }

    /// Run the engine to completion, then signal completion on the channel
    ///
    /// Returns the channel so callers can inspect or finish it.
    pub async fn start<C: ResultChannel>(&mut self, channel: C) -> RunnerResult<C> {
        let features = self.load_features().await?;
        if features.is_empty() {
            warn!("No feature files among {} configured files", self.config.files.len());
        }
        let options = self.options();

        let mut support = SupportCode::new(self.config.page.clone());
        self.loader.load(&mut support);

        info!("Starting engine with {} feature(s)", features.len());
        let mut listener = EventListener::new(channel);
        let report = self
            .engine
            .run(features, support, options, &mut listener)
            .await?;

        let mut channel = listener.into_channel();
        channel.complete(CompletionPayload {
            coverage: report.coverage,
        })?;
        info!("Run complete");
        Ok(channel)
    }

    async fn fetch(&self, path: &str) -> RunnerResult<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let response = self
                .client
                .get(path)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| load_error(path, e))?;
            response.text().await.map_err(|e| load_error(path, e))
        } else {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| load_error(path, e))
        }
    }
}

fn load_error(path: &str, e: impl std::fmt::Display) -> RunnerError {
    RunnerError::FeatureLoad {
        path: path.to_string(),
        reason: e.to_string(),
    }
}

fn is_feature(path: &str) -> bool {
    // Served paths may carry a cache-busting query
    let path = path.split('?').next().unwrap_or(path);
    path.ends_with(FEATURE_EXTENSION)
}

/// Expand directories into the feature files below them
///
/// Plain files and URLs are kept as given; each directory is walked and its
/// `*.feature` files are appended sorted by path.
pub fn discover_features<P: AsRef<str>>(paths: &[P]) -> Vec<String> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !Path::new(path).is_dir() {
            files.push(path.to_string());
            continue;
        }
        let mut found: Vec<String> = walkdir::WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_string_lossy().to_string())
            .filter(|p| is_feature(p))
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, EngineReport, EventSink};
    use async_trait::async_trait;
    use cukebridge_common::MemoryChannel;

    struct NullEngine;

    #[async_trait]
    impl TestEngine for NullEngine {
        async fn run(
            &mut self,
            _features: Vec<FeatureSource>,
            _support: SupportCode,
            _options: EngineOptions,
            sink: &mut dyn EventSink,
        ) -> RunnerResult<EngineReport> {
            sink.hear(EngineEvent::RunStarted)?;
            sink.hear(EngineEvent::RunFinished)?;
            Ok(EngineReport::default())
        }
    }

    fn runner(files: &[&str], args: &[&str]) -> Runner<NullEngine> {
        Runner::new(
            NullEngine,
            SupportCodeLoader::new(),
            RunnerConfig {
                files: files.iter().map(|f| f.to_string()).collect(),
                args: args.iter().map(|a| a.to_string()).collect(),
                page: PageConfig::default(),
            },
        )
    }

    #[test]
    fn test_feature_files_keep_order() {
        let runner = runner(
            &["b.feature", "steps.js", "a.feature?1234", "lib/c.feature", "x.features"],
            &[],
        );
        assert_eq!(
            runner.feature_files(),
            vec!["b.feature", "a.feature?1234", "lib/c.feature"]
        );
    }

    #[test]
    fn test_options_from_args() {
        let runner = runner(&[], &["--tags", "@a", "@b", "--name", "x"]);
        let options = runner.options();
        assert_eq!(options.get("tags"), ["@a", "@b"]);
        assert_eq!(options.get("name"), ["x"]);
    }

    #[tokio::test]
    async fn test_missing_feature_file_fails_load() {
        let runner = runner(&["/definitely/not/here.feature"], &[]);
        let err = runner.load_features().await.unwrap_err();
        assert!(matches!(err, RunnerError::FeatureLoad { .. }));
    }

    #[tokio::test]
    async fn test_start_signals_completion() {
        let mut runner = runner(&[], &[]);
        let channel = runner.start(MemoryChannel::default()).await.unwrap();
        assert_eq!(channel.completion(), Some(&CompletionPayload { coverage: None }));
        assert_eq!(channel.results().count(), 0);
    }

    #[test]
    fn test_discover_features_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.feature"), "Feature: B").unwrap();
        std::fs::write(dir.path().join("a.feature"), "Feature: A").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();
        std::fs::write(dir.path().join("nested/c.feature"), "Feature: C").unwrap();

        let root = dir.path().to_string_lossy().to_string();
        let files = discover_features(&[root.as_str(), "http://host/z.feature"]);
        let names: Vec<&str> = files
            .iter()
            .map(|f| f.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["a.feature", "b.feature", "c.feature", "z.feature"]);
    }
}
