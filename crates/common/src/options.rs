//! CLI-style engine options: `--tags @a @b --name x` → `{tags: [@a, @b], name: [x]}`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Flag name to the ordered values that followed it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineOptions(BTreeMap<String, Vec<String>>);

impl EngineOptions {
    /// Parse `--flag value...` tokens
    ///
    /// Tokens before the first flag are ignored. A flag without values still
    /// gets an (empty) entry. A bare `--` ends the current flag, and values
    /// following it are ignored until the next flag.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = BTreeMap::<String, Vec<String>>::new();
        let mut current: Option<String> = None;
        for arg in args {
            let arg = arg.as_ref();
            if let Some(name) = arg.strip_prefix("--") {
                if name.is_empty() {
                    current = None;
                } else {
                    options.entry(name.to_string()).or_default();
                    current = Some(name.to_string());
                }
            } else if let Some(name) = &current {
                options.entry(name.clone()).or_default().push(arg.to_string());
            } else {
                debug!("Ignoring engine argument {:?} outside any flag", arg);
            }
        }
        Self(options)
    }

    /// Values of a flag, empty when absent
    pub fn get(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}
