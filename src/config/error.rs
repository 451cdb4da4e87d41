//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Retrieval k must be between 1 and {max}")]
    InvalidRetrievalK { max: usize },

    #[error("Stream buffer must be at least 1")]
    InvalidStreamBuffer,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Accepts only `http://` and `https://` URLs with a host part.
pub(crate) fn check_http_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls_accepted() {
        assert!(check_http_url("x", "http://localhost:11434/v1").is_ok());
        assert!(check_http_url("x", "https://kb.internal").is_ok());
    }

    #[test]
    fn other_schemes_rejected() {
        assert!(check_http_url("x", "ftp://host").is_err());
        assert!(check_http_url("x", "localhost:8080").is_err());
        assert!(check_http_url("x", "http://").is_err());
    }
}
