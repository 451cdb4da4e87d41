//! API key and rate limit configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Access control for the coaching endpoints.
///
/// No configured keys leaves the API open, which suits local development.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Accepted `X-API-Key` values (comma-separated)
    pub api_keys: Option<Secret<String>>,

    /// Requests per minute per key or IP; 0 disables limiting
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Shared limiter backend. In-process counters are used when unset.
    pub redis_url: Option<String>,
}

impl AuthConfig {
    pub fn api_key_list(&self) -> Vec<Secret<String>> {
        self.api_keys
            .as_ref()
            .map(|keys| {
                keys.expose_secret()
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(|k| Secret::new(k.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit_per_minute > 0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ValidationError::InvalidUrl {
                    field: "auth.redis_url",
                    value: url.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys: None,
            rate_limit_per_minute: default_rate_limit(),
            redis_url: None,
        }
    }
}

fn default_rate_limit() -> u32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert!(config.api_key_list().is_empty());
        assert_eq!(config.rate_limit_per_minute, 60);
        assert!(config.rate_limiting_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_keys_split_and_trimmed() {
        let config = AuthConfig {
            api_keys: Some(Secret::new(" key-one, key-two ,,".to_string())),
            ..Default::default()
        };
        let keys: Vec<String> = config
            .api_key_list()
            .iter()
            .map(|k| k.expose_secret().clone())
            .collect();
        assert_eq!(keys, vec!["key-one", "key-two"]);
    }

    #[test]
    fn test_zero_rate_limit_disables() {
        let config = AuthConfig {
            rate_limit_per_minute: 0,
            ..Default::default()
        };
        assert!(!config.rate_limiting_enabled());
    }

    #[test]
    fn test_redis_url_scheme() {
        let config = AuthConfig {
            redis_url: Some("http://cache:6379".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AuthConfig {
            redis_url: Some("redis://cache:6379".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
