//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn test_example_file_parses() {
        let config = parse_config(include_str!("../../curation.example.toml")).unwrap();
        assert_eq!(config.auth.tokens.len(), 1);
        assert_eq!(config.auth.tokens[0].principal, "curator");
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
            [database]
            url = "sqlite::memory:"

            [[auth.tokens]]
            token = "s3cret"
            principal = "alice"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert!(config.database.is_in_memory());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.auth.tokens[0].principal, "alice");
        assert_eq!(config.observability.log_format, "json");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[listener\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n[security]\nmax_body_size = 0").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("timeouts.request_secs: must be > 0"));
        assert!(message.contains("security.max_body_size: must be > 0"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/curation.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
