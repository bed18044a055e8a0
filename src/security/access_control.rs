//! Access Control Middleware.
//! Applies the route access policy before any handler runs.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::access_policy::{AccessLevel, AccessPolicy};
use crate::security::auth::TokenStore;

/// State required for access control.
#[derive(Clone)]
pub struct AccessControlState {
    pub policy: Arc<AccessPolicy>,
    pub tokens: Arc<TokenStore>,
}

pub async fn access_control_middleware(
    State(state): State<AccessControlState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let access = state.policy.decide(req.method(), req.uri().path());
    let principal = state.tokens.authenticate(req.headers());

    match (access, principal) {
        (_, Ok(principal)) => {
            tracing::debug!(
                method = %req.method(),
                path = %req.uri().path(),
                %access,
                principal = %principal,
                "Request authenticated"
            );
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        // Anonymous (or bad credentials) is fine where no principal is needed
        (AccessLevel::Public, Err(_)) => next.run(req).await,
        (AccessLevel::Authenticated, Err(failure)) => {
            tracing::warn!(
                method = %req.method(),
                path = %req.uri().path(),
                reason = failure.as_str(),
                "Rejected unauthenticated request"
            );
            metrics::record_access_denied("unauthenticated");
            ApiError::Unauthorized(failure.as_str().to_string()).into_response()
        }
    }
}
