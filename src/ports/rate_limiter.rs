//! Rate limiting port for protecting the coaching endpoints.
//!
//! Fixed-window counters keyed by API key (or client IP when no keys are
//! configured). Implementations can use in-memory storage for a single
//! process or Redis for a shared deployment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Port for rate limiting operations.
///
/// Implementations should be thread-safe and support concurrent access.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check if a request is allowed, consuming one unit of quota if so.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;
}

/// Requests allowed per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_secs: u32,
}

impl RateLimitPolicy {
    pub fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            window_secs: 60,
        }
    }
}

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub scope: RateLimitScope,
    /// Identifier within the scope. API keys are stored as a fingerprint,
    /// never in clear.
    pub identifier: String,
}

/// The scope at which rate limiting is applied.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// Per API key.
    ApiKey,
    /// Per client IP address.
    Ip,
}

impl RateLimitKey {
    /// Key for an API key, identified by a SHA-256 fingerprint.
    pub fn api_key(api_key: &str) -> Self {
        let digest = Sha256::digest(api_key.as_bytes());
        let fingerprint: String = format!("{:x}", digest).chars().take(16).collect();
        Self {
            scope: RateLimitScope::ApiKey,
            identifier: fingerprint,
        }
    }

    pub fn ip(ip: &str) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: ip.to_string(),
        }
    }

    /// Returns the Redis key string for this rate limit key.
    pub fn to_redis_key(&self) -> String {
        format!("brew-coach:ratelimit:{}:{}", self.scope.as_str(), self.identifier)
    }
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::ApiKey => "api_key",
            RateLimitScope::Ip => "ip",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed(RateLimitStatus),
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: Timestamp,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    /// Seconds until the client should retry.
    pub retry_after_secs: u32,
    pub scope: RateLimitScope,
    pub message: String,
}

impl RateLimitDenied {
    pub fn new(limit: u32, retry_after_secs: u32, scope: RateLimitScope) -> Self {
        let retry_after_secs = retry_after_secs.max(1);
        Self {
            limit,
            retry_after_secs,
            scope,
            message: format!(
                "Rate limit exceeded for {}. Retry after {} seconds.",
                scope, retry_after_secs
            ),
        }
    }
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}
