//! Retrieval backend configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::{check_http_url, ValidationError};

/// Which retriever backs the coach.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalBackend {
    /// Keyword overlap over a YAML corpus
    #[default]
    InMemory,
    /// External similarity-search service
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub backend: RetrievalBackend,

    /// Search service URL, required for the http backend
    pub base_url: Option<String>,

    /// Corpus file for the in-memory backend. The bundled notes are used when unset.
    pub corpus_path: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == RetrievalBackend::Http {
            let url = self
                .base_url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .ok_or(ValidationError::MissingRequired("RETRIEVAL__BASE_URL"))?;
            check_http_url("retrieval.base_url", url)?;
            if self.timeout_secs == 0 {
                return Err(ValidationError::ZeroTimeout("retrieval"));
            }
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: RetrievalBackend::default(),
            base_url: None,
            corpus_path: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_in_memory() {
        let config = RetrievalConfig::default();
        assert_eq!(config.backend, RetrievalBackend::InMemory);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn http_backend_requires_base_url() {
        let config = RetrievalConfig {
            backend: RetrievalBackend::Http,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn http_backend_checks_scheme() {
        let config = RetrievalConfig {
            backend: RetrievalBackend::Http,
            base_url: Some("kb:9000".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RetrievalConfig {
            backend: RetrievalBackend::Http,
            base_url: Some("http://kb:9000".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
