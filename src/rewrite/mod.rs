//! Rewrite rules
//!
//! A rule maps a local path pattern to a backend URL template. Rules are
//! plain data: the router walks them in order and forwards to the first
//! destination produced. Nothing here does I/O.
//!
//! ```text
//!   /api/:path*  ──▶  https://backend.example/:path*
//!
//!   /api/v1/items/7?active=true  ──▶  https://backend.example/v1/items/7?active=true
//! ```

pub mod pattern;

pub use pattern::{DestinationTemplate, SourcePattern};

use crate::config::BackendAddress;
use std::fmt;

/// Local prefix that is forwarded to the backend.
pub const API_PREFIX: &str = "/api/";

/// Wildcard name shared by the API rule's source and destination.
pub const API_WILDCARD: &str = "path";

/// One `(source, destination)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    source: SourcePattern,
    destination: DestinationTemplate,
}

impl RewriteRule {
    /// Builds a prefix rule. Both sides reference the same wildcard, so the
    /// destination always contains it exactly once.
    pub fn prefix(prefix: &str, wildcard: &str, destination_base: impl Into<String>) -> Self {
        Self {
            source: SourcePattern::new(prefix, wildcard),
            destination: DestinationTemplate::new(destination_base, wildcard),
        }
    }

    pub fn source(&self) -> &SourcePattern {
        &self.source
    }

    pub fn destination(&self) -> &DestinationTemplate {
        &self.destination
    }

    /// Computes the destination URL for a request target (path plus optional
    /// query), or `None` if the path does not match.
    ///
    /// The capture and the query are copied verbatim; nothing is decoded.
    pub fn rewrite(&self, target: &str) -> Option<String> {
        self.apply(target).map(|(_, destination)| destination)
    }

    fn apply<'t>(&self, target: &'t str) -> Option<(&'t str, String)> {
        let (path, query) = split_target(target);
        let capture = self.source.capture(path)?;
        Some((capture, self.destination.expand(capture, query)))
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// A matched rule and the URL it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite<'a> {
    pub rule: &'a RewriteRule,
    /// The wildcard text taken from the request path.
    pub capture: &'a str,
    pub destination: String,
}

impl Rewrite<'_> {
    /// True if the capture contains a `.` or `..` segment, plain or
    /// percent-encoded.
    ///
    /// URL parsing resolves such segments, so forwarding them could reach a
    /// backend path outside the destination base.
    pub fn has_dot_segment(&self) -> bool {
        has_dot_segment(self.capture)
    }
}

/// Ordered rule list, evaluated first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteRules {
    rules: Vec<RewriteRule>,
}

impl RewriteRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule after all existing ones.
    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RewriteRule> {
        self.rules.iter()
    }

    /// Returns the first rule matching `target`, with its destination.
    pub fn resolve<'a>(&'a self, target: &'a str) -> Option<Rewrite<'a>> {
        self.rules.iter().find_map(|rule| {
            rule.apply(target).map(|(capture, destination)| Rewrite {
                rule,
                capture,
                destination,
            })
        })
    }
}

impl<'a> IntoIterator for &'a RewriteRules {
    type Item = &'a RewriteRule;
    type IntoIter = std::slice::Iter<'a, RewriteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Builds the rule set for `backend`: a single `/api/:path*` rule pointing at
/// `<backend>/:path*`.
pub fn build_rewrite_rules(backend: &BackendAddress) -> RewriteRules {
    let mut rules = RewriteRules::new();
    rules.push(RewriteRule::prefix(
        API_PREFIX,
        API_WILDCARD,
        format!("{}/", backend.as_str()),
    ));
    rules
}

/// Checks every segment of `capture` for `.` or `..`.
///
/// Backslashes count as separators and `%2e` as a dot, matching how special
/// URLs are parsed.
pub fn has_dot_segment(capture: &str) -> bool {
    capture.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

/// Splits a request target at the first `?`.
fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_target_keeps_later_question_marks_in_query() {
        assert_eq!(split_target("/a?b=1?c"), ("/a", Some("b=1?c")));
        assert_eq!(split_target("/a"), ("/a", None));
    }

    #[test]
    fn dot_segments_detected_in_any_spelling() {
        for capture in ["..", "a/../b", ".", "a/./b", "%2e%2e/x", "%2E.", ".%2e", "a\\..\\b", "x/.."] {
            assert!(has_dot_segment(capture), "{capture}");
        }
        for capture in ["", "a/b", "...", "a..b", ".hidden", "v1/items%2e", "%2e%2e%2e"] {
            assert!(!has_dot_segment(capture), "{capture}");
        }
    }

    #[test]
    fn api_prefix_in_query_does_not_match() {
        let rules = build_rewrite_rules(&BackendAddress::new("http://b"));
        assert!(rules.resolve("/other?next=/api/x").is_none());
    }
}
