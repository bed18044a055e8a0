//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool size > 0)
//! - Validate addresses, origins and tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check every section of the config and collect all problems.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if !config.database.url.starts_with("sqlite:") {
        errors.push(ValidationError::new(
            "database.url",
            "only sqlite: URLs are supported",
        ));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be > 0"));
    }
    if config.database.acquire_timeout_secs == 0 {
        errors.push(ValidationError::new("database.acquire_timeout_secs", "must be > 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" {
            if config.cors.allow_credentials {
                errors.push(ValidationError::new(
                    "cors.allowed_origins",
                    "'*' cannot be combined with allow_credentials",
                ));
            }
            continue;
        }
        if let Err(message) = check_origin(origin) {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("'{}' {}", origin, message),
            ));
        }
    }

    let mut seen = HashSet::new();
    for (i, entry) in config.auth.tokens.iter().enumerate() {
        if entry.token.trim().is_empty() {
            errors.push(ValidationError::new(format!("auth.tokens[{}].token", i), "must not be empty"));
        } else if !seen.insert(entry.token.as_str()) {
            errors.push(ValidationError::new(format!("auth.tokens[{}].token", i), "duplicate token"));
        }
        if entry.principal.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("auth.tokens[{}].principal", i),
                "must not be empty",
            ));
        }
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not one of {:?}", obs.log_level, LOG_LEVELS),
        ));
    }
    if !LOG_FORMATS.contains(&obs.log_format.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("'{}' is not one of {:?}", obs.log_format, LOG_FORMATS),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is scheme + host + optional port, nothing else.
fn check_origin(origin: &str) -> Result<(), &'static str> {
    let url = Url::parse(origin).map_err(|_| "is not a valid URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("must use http or https");
    }
    if url.host_str().is_none() {
        return Err("has no host");
    }
    if origin.ends_with('/') || url.path() != "/" || url.query().is_some() {
        return Err("must not contain a path or query");
    }
    Ok(())
}
