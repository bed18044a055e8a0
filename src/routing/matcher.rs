//! Request matching logic.
//!
//! # Responsibilities
//! - Match the HTTP method (one of a set, or any)
//! - Match the path against Ant-style patterns
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching is segment based and case-sensitive
//! - `{name}` and `*` match exactly one non-empty segment
//! - A trailing `**` matches zero or more segments; anywhere else it is rejected
//! - Trailing slashes are significant
//! - No regex to guarantee O(n) matching

use std::fmt;

use axum::http::Method;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if a request with this method and path matches.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Error for a path pattern that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{name}` or `*`
    Single,
    /// Trailing `**`
    Rest,
}

/// A compiled Ant-style path pattern such as `/api/v1/playlists/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let error = |reason| PatternError {
            pattern: pattern.to_string(),
            reason,
        };

        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(error("must start with '/'"));
        };

        let mut segments = Vec::new();
        if !rest.is_empty() {
            let parts: Vec<&str> = rest.split('/').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.into_iter().enumerate() {
                let segment = match part {
                    "**" if i == last => Segment::Rest,
                    "**" => return Err(error("'**' is only allowed as the last segment")),
                    "*" => Segment::Single,
                    p if p.starts_with('{') && p.ends_with('}') && p.len() > 2 => Segment::Single,
                    p if p.contains(['{', '}', '*']) => {
                        return Err(error("wildcards must span a whole segment"))
                    }
                    p => Segment::Literal(p.to_string()),
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `path` (no query string) matches this pattern.
    pub fn matches_path(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut parts = parts.into_iter();
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Single => match parts.next() {
                    Some(p) if !p.is_empty() => {}
                    _ => return false,
                },
                Segment::Literal(lit) => match parts.next() {
                    Some(p) if p == lit => {}
                    _ => return false,
                },
            }
        }
        parts.next().is_none()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Matches the request path against a [`PathPattern`].
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: PathPattern,
}

impl PathMatcher {
    pub fn new(pattern: PathPattern) -> Self {
        Self { pattern }
    }

    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        PathPattern::parse(pattern).map(Self::new)
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        self.pattern.matches_path(path)
    }
}

/// Matches one of a set of methods. An empty set matches any method.
#[derive(Debug, Clone, Default)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn one_of(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: &Method, _path: &str) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Matches if any of its matchers matches.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(method, path))
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, method: &Method, path: &str) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(method, path))
    }
}
