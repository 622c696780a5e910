//! Path and stack-trace cleanup
//!
//! Browser-side paths carry the test server's mount prefix (`.../base/`,
//! `.../absolute/`) and cache-busting query strings. Both are removed so that
//! locations and stack traces read the same on every machine and port.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

static SERVED_BASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*/base/").expect("static regex"));
static SERVED_ABSOLUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*/absolute/").expect("static regex"));

static SERVED_BASE_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^.*/base/").expect("static regex"));
static SERVED_ABSOLUTE_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^.*/absolute/").expect("static regex"));

/// Stack frames that belong to the engine bundle rather than to user code
static ENGINE_FRAMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^.*/release/cucumber\.js.*$").expect("static regex"));

/// A `?` up to the next `:` (the line/column separator)
static QUERY_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?[^:]+").expect("static regex"));

static TRAILING_QUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?.*$").expect("static regex"));

/// Lowercase and hyphenate whitespace runs: `"Valid  credentials"` → `"valid-credentials"`
pub fn slugify(name: &str) -> String {
    WHITESPACE.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// Feature uri relative to the served base directory
pub fn feature_uri(uri: &str) -> String {
    SERVED_BASE.replace(uri, "").into_owned()
}

/// Clean a `path:line` location
pub fn location(raw: &str) -> String {
    let stripped = SERVED_BASE.replace(raw, "");
    let stripped = SERVED_ABSOLUTE.replace(&stripped, "/");
    QUERY_STRING.replace_all(&stripped, "").into_owned()
}

/// Clean a multi-line failure stack
pub fn stack_trace(raw: &str) -> String {
    let cleaned = SERVED_BASE_LINES.replace_all(raw, "");
    let cleaned = SERVED_ABSOLUTE_LINES.replace_all(&cleaned, "/");
    let cleaned = ENGINE_FRAMES.replace_all(&cleaned, "");
    let cleaned = QUERY_STRING.replace_all(&cleaned, "");
    cleaned.trim_end_matches('\n').to_string()
}

/// Source url of an uncaught page script error, minus its query string
pub fn script_source(source: &str) -> String {
    TRAILING_QUERY.replace(source, "").into_owned()
}
