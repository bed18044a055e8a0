//! Bearer token authentication.

use std::collections::HashMap;
use std::fmt;

use axum::http::{header, HeaderMap};
use serde::Serialize;

use crate::config::AuthConfig;

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub name: String,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Why credentials on a request were not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Missing,
    Malformed,
    UnknownToken,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::Missing => "missing credentials",
            AuthFailure::Malformed => "malformed Authorization header",
            AuthFailure::UnknownToken => "unknown bearer token",
        }
    }
}

/// Token → principal table, frozen at startup.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: HashMap<String, Principal>,
}

impl TokenStore {
    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    Principal {
                        name: t.principal.clone(),
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolve the `Authorization: Bearer` header to a principal.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthFailure> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthFailure::Missing)?
            .to_str()
            .map_err(|_| AuthFailure::Malformed)?;

        let token = bearer_token(value).ok_or(AuthFailure::Malformed)?;

        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthFailure::UnknownToken)
    }
}

/// Extract the token from a `Bearer <token>` header value. The scheme is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use axum::http::HeaderValue;

    fn store() -> TokenStore {
        TokenStore::from_config(&AuthConfig {
            tokens: vec![TokenConfig {
                token: "s3cret".into(),
                principal: "alice".into(),
            }],
        })
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token() {
        let principal = store().authenticate(&headers("Bearer s3cret")).unwrap();
        assert_eq!(principal.name, "alice");

        let principal = store().authenticate(&headers("bearer  s3cret ")).unwrap();
        assert_eq!(principal.to_string(), "alice");
    }

    #[test]
    fn test_rejections() {
        let store = store();
        assert_eq!(store.authenticate(&HeaderMap::new()), Err(AuthFailure::Missing));
        assert_eq!(store.authenticate(&headers("Basic s3cret")), Err(AuthFailure::Malformed));
        assert_eq!(store.authenticate(&headers("Bearer")), Err(AuthFailure::Malformed));
        assert_eq!(store.authenticate(&headers("Bearer nope")), Err(AuthFailure::UnknownToken));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Token abc"), None);
    }
}
