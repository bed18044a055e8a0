//! Cross-origin request policy.
//!
//! Two pieces work together:
//! - [`cors_guard_middleware`] rejects requests whose `Origin` (or preflight
//!   method/headers) falls outside the allow-list with 403.
//! - [`CorsPolicy::layer`] builds the tower-http `CorsLayer` that answers
//!   preflights and adds `Access-Control-*` headers for allowed origins.
//!
//! Requests without an `Origin` header are not cross-origin and pass through,
//! and so are requests whose `Origin` is this server itself. Browsers send
//! `Origin` on same-origin POST/PUT/DELETE too.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use url::Url;

use crate::config::CorsConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;

/// Why a cross-origin request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsRejection {
    Origin(String),
    Method(String),
    Headers(String),
}

/// Allow-list for cross-origin requests. Immutable after startup.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<HeaderValue>,
    any_origin: bool,
    methods: Vec<Method>,
    headers: Vec<HeaderName>,
    allow_credentials: bool,
    max_age: Duration,
}

impl CorsPolicy {
    /// Origins that fail to parse as header values are dropped with a warning.
    pub fn from_config(config: &CorsConfig) -> Self {
        let any_origin = config.allowed_origins.iter().any(|o| o == "*");
        let origins = config
            .allowed_origins
            .iter()
            .filter(|o| o.as_str() != "*")
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();

        Self {
            origins,
            any_origin,
            methods: vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS],
            headers: vec![header::AUTHORIZATION, header::CONTENT_TYPE],
            allow_credentials: config.allow_credentials,
            max_age: Duration::from_secs(config.max_age_secs),
        }
    }

    pub fn is_origin_allowed(&self, origin: &HeaderValue) -> bool {
        self.any_origin || self.origins.iter().any(|o| o == origin)
    }

    /// Validate the CORS headers of a request.
    pub fn check(&self, method: &Method, headers: &HeaderMap) -> Result<(), CorsRejection> {
        let Some(origin) = headers.get(header::ORIGIN) else {
            return Ok(());
        };
        if is_same_origin(origin, headers) {
            return Ok(());
        }
        if !self.is_origin_allowed(origin) {
            return Err(CorsRejection::Origin(lossy(origin)));
        }

        let Some(requested) = preflight_method(method, headers) else {
            return Ok(());
        };
        let allowed_method = Method::from_bytes(requested.as_bytes())
            .map(|m| self.methods.contains(&m))
            .unwrap_or(false);
        if !allowed_method {
            return Err(CorsRejection::Method(lossy(requested)));
        }

        if let Some(requested) = headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            let list = requested.to_str().map_err(|_| CorsRejection::Headers(lossy(requested)))?;
            for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                let known = self.headers.iter().any(|h| h.as_str().eq_ignore_ascii_case(name));
                if !known {
                    return Err(CorsRejection::Headers(name.to_string()));
                }
            }
        }

        Ok(())
    }

    /// tower-http layer answering preflights and decorating responses.
    pub fn layer(&self) -> CorsLayer {
        let allow_origin = if self.any_origin {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(self.origins.clone())
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(self.methods.clone())
            .allow_headers(self.headers.clone())
            .allow_credentials(self.allow_credentials)
            .max_age(self.max_age)
    }
}

/// `Some(requested method)` for a preflight request.
fn preflight_method<'a>(method: &Method, headers: &'a HeaderMap) -> Option<&'a HeaderValue> {
    if *method == Method::OPTIONS {
        headers.get(header::ACCESS_CONTROL_REQUEST_METHOD)
    } else {
        None
    }
}

/// `Origin` equals the request's own scheme, host and port (from `Host`).
/// The listener speaks plain HTTP only.
fn is_same_origin(origin: &HeaderValue, headers: &HeaderMap) -> bool {
    let Some(host) = headers.get(header::HOST).and_then(|h| h.to_str().ok()) else {
        return false;
    };
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let (Ok(origin), Ok(own)) = (Url::parse(origin), Url::parse(&format!("http://{}", host))) else {
        return false;
    };

    origin.scheme() == own.scheme()
        && origin.host_str() == own.host_str()
        && origin.port_or_known_default() == own.port_or_known_default()
}

fn lossy(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// Reject cross-origin requests outside the allow-list before anything else runs.
pub async fn cors_guard_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match policy.check(req.method(), req.headers()) {
        Ok(()) => next.run(req).await,
        Err(rejection) => {
            tracing::warn!(
                method = %req.method(),
                path = %req.uri().path(),
                rejection = ?rejection,
                "CORS request rejected"
            );
            metrics::record_access_denied("cors_origin");
            ApiError::Forbidden("Invalid CORS request".to_string()).into_response()
        }
    }
}
