//! Coaching dialogue tuning

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::{CoachSettings, MAX_RETRIEVAL_K};

#[derive(Debug, Clone, Deserialize)]
pub struct CoachConfig {
    /// Reference snippets cited per recommendation
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    #[serde(default = "default_retrieval_timeout_ms")]
    pub retrieval_timeout_ms: u64,

    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub phrase_with_generator: bool,

    /// Bounded channel capacity between producer and client
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl CoachConfig {
    pub fn settings(&self) -> CoachSettings {
        CoachSettings {
            retrieval_k: self.retrieval_k,
            retrieval_timeout: Duration::from_millis(self.retrieval_timeout_ms),
            generation_timeout: Duration::from_millis(self.generation_timeout_ms),
            phrase_with_generator: self.phrase_with_generator,
            stream_buffer: self.stream_buffer,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_RETRIEVAL_K).contains(&self.retrieval_k) {
            return Err(ValidationError::InvalidRetrievalK {
                max: MAX_RETRIEVAL_K,
            });
        }
        if self.stream_buffer == 0 {
            return Err(ValidationError::InvalidStreamBuffer);
        }
        if self.retrieval_timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout("coach.retrieval"));
        }
        if self.generation_timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout("coach.generation"));
        }
        Ok(())
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            retrieval_k: default_retrieval_k(),
            retrieval_timeout_ms: default_retrieval_timeout_ms(),
            generation_timeout_ms: default_generation_timeout_ms(),
            phrase_with_generator: true,
            stream_buffer: default_stream_buffer(),
        }
    }
}

fn default_retrieval_k() -> usize {
    2
}

fn default_retrieval_timeout_ms() -> u64 {
    1500
}

fn default_generation_timeout_ms() -> u64 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_stream_buffer() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_defaults() {
        let settings = CoachConfig::default().settings();
        let expected = CoachSettings::default();
        assert_eq!(settings.retrieval_k, expected.retrieval_k);
        assert_eq!(settings.retrieval_timeout, expected.retrieval_timeout);
        assert_eq!(settings.generation_timeout, expected.generation_timeout);
        assert_eq!(settings.stream_buffer, expected.stream_buffer);
        assert!(settings.phrase_with_generator);
    }

    #[test]
    fn retrieval_k_bounds() {
        for k in [0, MAX_RETRIEVAL_K + 1] {
            let config = CoachConfig {
                retrieval_k: k,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "k = {}", k);
        }
        let config = CoachConfig {
            retrieval_k: MAX_RETRIEVAL_K,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_stream_buffer_rejected() {
        let config = CoachConfig {
            stream_buffer: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStreamBuffer)
        ));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let config = CoachConfig {
            generation_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
