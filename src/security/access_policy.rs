//! Route access policy.
//!
//! An ordered table of `(methods, path patterns, access level)` rules,
//! evaluated top to bottom. The first matching rule decides; requests no
//! rule matches fall through to the policy default.

use std::fmt;

use axum::http::Method;
use serde::Serialize;

use crate::routing::{AndMatcher, AnyMatcher, Matcher, MethodMatcher, PathMatcher, PatternError};

/// What a request needs before a handler may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No credential required.
    Public,
    /// A valid principal is required.
    Authenticated,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Public => f.write_str("public"),
            AccessLevel::Authenticated => f.write_str("authenticated"),
        }
    }
}

/// One row of the policy table.
#[derive(Debug)]
pub struct AccessRule {
    matcher: AndMatcher,
    methods: Vec<Method>,
    patterns: Vec<String>,
    access: AccessLevel,
}

impl AccessRule {
    /// `methods` empty means any method.
    pub fn new(methods: &[Method], patterns: &[&str], access: AccessLevel) -> Result<Self, PatternError> {
        let mut paths: Vec<Box<dyn Matcher>> = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            paths.push(Box::new(PathMatcher::parse(pattern)?));
        }

        let matcher = AndMatcher::new(vec![
            Box::new(MethodMatcher::one_of(methods.iter().cloned())),
            Box::new(AnyMatcher::new(paths)),
        ]);

        Ok(Self {
            matcher,
            methods: methods.to_vec(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            access,
        })
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.matcher.matches(method, path)
    }
}

impl fmt::Display for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.methods.is_empty() {
            write!(f, "*")?;
        } else {
            let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
            write!(f, "{}", methods.join("|"))?;
        }
        write!(f, " {} -> {}", self.patterns.join(", "), self.access)
    }
}

/// Immutable, ordered rule table. Safe to share across tasks without locks.
#[derive(Debug)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    default_access: AccessLevel,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>, default_access: AccessLevel) -> Self {
        Self {
            rules,
            default_access,
        }
    }

    /// The route table of the curation API.
    pub fn curation_api() -> Result<Self, PatternError> {
        use AccessLevel::{Authenticated, Public};

        let rules = vec![
            AccessRule::new(&[Method::GET], &["/api/v1/playlists", "/api/v1/playlists/{id}"], Public)?,
            AccessRule::new(
                &[Method::GET, Method::PUT, Method::POST, Method::DELETE],
                &["/api/v1/curation/**"],
                Public,
            )?,
            AccessRule::new(&[], &["/api/v1/playlists/**"], Authenticated)?,
            AccessRule::new(&[], &["/swagger-ui/**", "/v3/api-docs/**"], Public)?,
        ];

        Ok(Self::new(rules, Authenticated))
    }

    /// First matching rule, if any.
    pub fn matching_rule(&self, method: &Method, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.matches(method, path))
    }

    pub fn decide(&self, method: &Method, path: &str) -> AccessLevel {
        self.matching_rule(method, path)
            .map(AccessRule::access)
            .unwrap_or(self.default_access)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn default_access(&self) -> AccessLevel {
        self.default_access
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::AccessLevel::{Authenticated, Public};

    fn policy() -> AccessPolicy {
        AccessPolicy::curation_api().unwrap()
    }

    #[test]
    fn test_playlist_reads_are_public() {
        let policy = policy();
        assert_eq!(policy.decide(&Method::GET, "/api/v1/playlists"), Public);
        assert_eq!(policy.decide(&Method::GET, "/api/v1/playlists/7"), Public);
    }

    #[test]
    fn test_playlist_writes_need_authentication() {
        let policy = policy();
        assert_eq!(policy.decide(&Method::POST, "/api/v1/playlists"), Authenticated);
        assert_eq!(policy.decide(&Method::PUT, "/api/v1/playlists/7"), Authenticated);
        assert_eq!(policy.decide(&Method::DELETE, "/api/v1/playlists/7"), Authenticated);
        assert_eq!(
            policy.decide(&Method::GET, "/api/v1/playlists/7/recommendation"),
            Authenticated
        );
    }

    #[test]
    fn test_curation_is_public_for_listed_methods_only() {
        let policy = policy();
        for method in [Method::GET, Method::PUT, Method::POST, Method::DELETE] {
            assert_eq!(policy.decide(&method, "/api/v1/curation/42"), Public);
        }
        assert_eq!(policy.decide(&Method::GET, "/api/v1/curation"), Public);
        assert_eq!(policy.decide(&Method::PATCH, "/api/v1/curation/42"), Authenticated);
        assert_eq!(policy.decide(&Method::OPTIONS, "/api/v1/curation/42"), Authenticated);
    }

    #[test]
    fn test_docs_are_public_for_any_method() {
        let policy = policy();
        assert_eq!(policy.decide(&Method::GET, "/swagger-ui/index.html"), Public);
        assert_eq!(policy.decide(&Method::HEAD, "/v3/api-docs"), Public);
        assert_eq!(policy.decide(&Method::POST, "/v3/api-docs/swagger-config"), Public);
    }

    #[test]
    fn test_everything_else_needs_authentication() {
        let policy = policy();
        assert_eq!(policy.decide(&Method::GET, "/"), Authenticated);
        assert_eq!(policy.decide(&Method::GET, "/health"), Authenticated);
        assert_eq!(policy.decide(&Method::GET, "/api/v1/users/1"), Authenticated);
        assert_eq!(policy.decide(&Method::GET, "/api/v1/playlists/"), Authenticated);
        assert!(policy.matching_rule(&Method::GET, "/health").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let policy = AccessPolicy::new(
            vec![
                AccessRule::new(&[Method::GET], &["/items/{id}"], Public).unwrap(),
                AccessRule::new(&[], &["/items/**"], Authenticated).unwrap(),
                AccessRule::new(&[], &["/items/open"], Public).unwrap(),
            ],
            Public,
        );

        // The broader catch-all shadows the later, more specific rule
        assert_eq!(policy.decide(&Method::GET, "/items/open"), Public);
        assert_eq!(policy.decide(&Method::POST, "/items/open"), Authenticated);
        assert_eq!(policy.decide(&Method::POST, "/other"), Public);
    }

    #[test]
    fn test_rule_display() {
        let policy = policy();
        assert_eq!(
            policy.rules()[0].to_string(),
            "GET /api/v1/playlists, /api/v1/playlists/{id} -> public"
        );
        assert_eq!(
            policy.rules()[2].to_string(),
            "* /api/v1/playlists/** -> authenticated"
        );
    }

    #[test]
    fn test_invalid_rule_pattern() {
        assert!(AccessRule::new(&[], &["/a/**/b"], Public).is_err());
    }
}
