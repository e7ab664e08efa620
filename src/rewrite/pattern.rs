//! Source patterns and destination templates.
//!
//! Both render in the `:name*` wildcard notation, e.g. `/api/:path*` and
//! `https://backend.example/:path*`.

use std::fmt;

/// A literal path prefix followed by a trailing wildcard.
///
/// The wildcard captures everything after the prefix: zero or more
/// `/`-separated segments, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePattern {
    prefix: String,
    wildcard: String,
}

impl SourcePattern {
    pub fn new(prefix: impl Into<String>, wildcard: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            wildcard: wildcard.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn wildcard(&self) -> &str {
        &self.wildcard
    }

    /// Returns the wildcard capture if `path` starts with the prefix.
    ///
    /// `path` must not contain the query string.
    pub fn capture<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }
}

impl fmt::Display for SourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}*", self.prefix, self.wildcard)
    }
}

/// A destination URL with the captured wildcard appended to a fixed base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTemplate {
    base: String,
    wildcard: String,
}

impl DestinationTemplate {
    pub fn new(base: impl Into<String>, wildcard: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            wildcard: wildcard.into(),
        }
    }

    /// Everything before the wildcard placeholder.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn wildcard(&self) -> &str {
        &self.wildcard
    }

    /// Substitutes `capture` for the wildcard and re-attaches the query.
    pub fn expand(&self, capture: &str, query: Option<&str>) -> String {
        let query_len = query.map_or(0, |q| q.len() + 1);
        let mut out = String::with_capacity(self.base.len() + capture.len() + query_len);

        out.push_str(&self.base);
        out.push_str(capture);
        if let Some(query) = query {
            out.push('?');
            out.push_str(query);
        }
        out
    }
}

impl fmt::Display for DestinationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}*", self.base, self.wildcard)
    }
}
