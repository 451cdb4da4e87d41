//! Generation collaborator configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::{check_http_url, ValidationError};
use crate::adapters::ai::OpenAIConfig;

/// OpenAI-compatible generation server settings.
///
/// Disabled by default: the coach answers deterministically without it.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token, if the server wants one
    pub api_key: Option<Secret<String>>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Provider settings for the OpenAI-compatible adapter.
    pub fn provider_config(&self) -> OpenAIConfig {
        let mut config = OpenAIConfig::default()
            .with_base_url(self.base_url.clone())
            .with_model(self.model.clone())
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries);
        if let Some(key) = self.api_key.as_ref().filter(|_| self.has_api_key()) {
            config = config.with_api_key(key.clone());
        }
        config
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        check_http_url("ai.base_url", &self.base_url)?;
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__MODEL"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("ai"));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_model() -> String {
    "phi3:mini".to_string()
}

fn default_timeout() -> u64 {
    20
}

fn default_retries() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.model, "phi3:mini");
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.max_retries, 1);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_disabled_config_skips_validation() {
        let config = AiConfig {
            base_url: "nonsense".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_requires_http_url() {
        let config = AiConfig {
            enabled: true,
            base_url: "localhost:11434".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_enabled_rejects_zero_timeout() {
        let config = AiConfig {
            enabled: true,
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_config_carries_settings() {
        let config = AiConfig {
            enabled: true,
            base_url: "http://gen:8000/v1/".to_string(),
            api_key: Some(Secret::new("sk-local".to_string())),
            model: "llama3".to_string(),
            timeout_secs: 5,
            max_retries: 2,
        };
        let provider = config.provider_config();
        assert_eq!(provider.base_url, "http://gen:8000/v1");
        assert_eq!(provider.model, "llama3");
        assert_eq!(provider.timeout, Duration::from_secs(5));
        assert_eq!(provider.max_retries, 2);
        assert!(provider.has_api_key());
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = AiConfig {
            api_key: Some(Secret::new(String::new())),
            ..Default::default()
        };
        assert!(!config.has_api_key());
        assert!(!config.provider_config().has_api_key());
    }
}
