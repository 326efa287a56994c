//! Callback name extraction and validation.
//!
//! # Responsibilities
//! - Read the callback name from the configured request header
//! - Reject names that are not plain (optionally dotted) JavaScript identifiers
//! - Reject reserved words in any segment
//!
//! # Design Decisions
//! - The callback text is emitted unescaped into a script body, so only a
//!   whitelist grammar is accepted
//! - Invalid or missing names degrade to "no callback", never to an error
//! - `Callback` can only be built through validation

use std::fmt;
use std::sync::OnceLock;

use axum::http::{HeaderMap, HeaderName};
use regex::Regex;

/// ECMAScript reserved and future-reserved words, plus the literal names.
pub const RESERVED_WORDS: &[&str] = &[
    "break", "do", "instanceof", "typeof", "case", "else", "new", "var", "catch", "finally",
    "return", "void", "continue", "for", "switch", "while", "debugger", "function", "this",
    "with", "default", "if", "throw", "delete", "in", "try", "class", "enum", "extends", "super",
    "const", "export", "import", "implements", "let", "private", "public", "yield", "interface",
    "package", "protected", "static", "null", "true", "false",
];

/// Identifier followed by zero or more `[0]`, `["key"]` or `['key']` accessors.
const SEGMENT_PATTERN: &str =
    r#"^[a-zA-Z_$][0-9a-zA-Z_$]*(?:\[(?:"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|[0-9]+)\])*$"#;

fn segment_regex() -> &'static Regex {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT.get_or_init(|| Regex::new(SEGMENT_PATTERN).expect("segment pattern is valid"))
}

/// Returns true if `name` may be used as a JSONP callback.
///
/// The name is split on `.` and every segment must match the identifier
/// grammar and must not be a reserved word.
pub fn is_valid_callback(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    name.split('.').all(|segment| {
        !RESERVED_WORDS.contains(&segment) && segment_regex().is_match(segment)
    })
}

/// A validated callback function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback(String);

impl Callback {
    /// Validate `name`, returning `None` if it cannot be used as a callback.
    pub fn parse(name: &str) -> Option<Self> {
        is_valid_callback(name).then(|| Self(name.to_string()))
    }

    /// Read and validate the first value of `header` from the request headers.
    ///
    /// Values that are not visible ASCII are treated as absent.
    pub fn from_headers(headers: &HeaderMap, header: &HeaderName) -> Option<Self> {
        let raw = headers.get(header)?.to_str().ok()?;
        let callback = Self::parse(raw);
        if callback.is_none() {
            tracing::debug!(header = %header, value = raw, "Ignoring invalid callback name");
        }
        callback
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a JSON document in a call to this callback.
    pub fn wrap(&self, json: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + json.len() + 2);
        out.push_str(&self.0);
        out.push('(');
        out.push_str(json);
        out.push(')');
        out
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
