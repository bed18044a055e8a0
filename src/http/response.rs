//! Error responses.
//!
//! # Responsibilities
//! - Map service and data-store errors to HTTP status codes
//! - Render every error as `{"error": "<kind>", "message": "<text>"}`
//! - Turn axum extractor rejections into the same body
//!
//! # Design Decisions
//! - Store unreachable → 503, any other store failure → 500
//! - 5xx logged at error level, client errors at debug

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::playlist::{DataAccessError, ServiceError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Timeout(String),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::DataAccess(DataAccessError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DataAccess(DataAccessError::Query(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Timeout(_) => "timeout",
            ApiError::DataAccess(DataAccessError::Unavailable(_)) => "unavailable",
            ApiError::DataAccess(DataAccessError::Query(_)) => "internal",
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ServiceError::Validation(message) => ApiError::Validation(message),
            ServiceError::DataAccess(e) => ApiError::DataAccess(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Body limit hits surface as a buffering failure with status 413
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::Validation(rejection.body_text())
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Store details stay in the log, not the response body
        let message = match &self {
            ApiError::DataAccess(e) => {
                tracing::error!(error = %e, "Data access failed");
                match e {
                    DataAccessError::Unavailable(_) => "data store unavailable".to_string(),
                    DataAccessError::Query(_) => "internal error".to_string(),
                }
            }
            other => {
                tracing::debug!(status = %status, error = %other, "Request failed");
                other.to_string()
            }
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(DataAccessError::Unavailable(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DataAccessError::Query(sqlx::Error::RowNotFound)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_error_conversion() {
        let err = ApiError::from(ServiceError::NotFound(9));
        assert!(matches!(&err, ApiError::NotFound(m) if m == "playlist 9 not found"));

        let err = ApiError::from(ServiceError::Validation("title must not be empty".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_extra_statuses() {
        assert_eq!(ApiError::PayloadTooLarge("x".into()).status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiError::Timeout("x".into()).status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(ApiError::Timeout("x".into()).kind(), "timeout");
    }

    #[test]
    fn test_unauthorized_sets_challenge() {
        let response = ApiError::Unauthorized("missing credentials".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
