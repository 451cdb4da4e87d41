//! Redis-backed rate limiter for multi-instance deployments.
//!
//! Uses a fixed-window counter with Redis INCR + EXPIRE.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult,
    RateLimitStatus, RateLimiter,
};

/// Redis-backed fixed-window rate limiter.
///
/// 1. INCR the key
/// 2. If the count is 1, EXPIRE it after the window
/// 3. If the count exceeds the limit, deny
///
/// Requests can briefly exceed the limit around window boundaries.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    policy: RateLimitPolicy,
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, policy: RateLimitPolicy) -> Self {
        Self { conn, policy }
    }

    /// Opens a multiplexed connection to `url`.
    pub async fn connect(url: &str, policy: RateLimitPolicy) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn, policy))
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let redis_key = key.to_redis_key();
        let RateLimitPolicy { limit, window_secs } = self.policy;
        let mut conn = self.conn.clone();

        let count: i64 = conn.incr(&redis_key, 1_i64).await.map_err(unavailable)?;

        if count == 1 {
            conn.expire::<_, ()>(&redis_key, window_secs as i64)
                .await
                .map_err(unavailable)?;
        }

        let ttl: i64 = conn.ttl(&redis_key).await.map_err(unavailable)?;
        let reset_secs = if ttl > 0 { ttl as u64 } else { window_secs as u64 };

        if count > limit as i64 {
            return Ok(RateLimitResult::Denied(RateLimitDenied::new(
                limit,
                reset_secs as u32,
                key.scope,
            )));
        }

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count as u32),
            reset_at: Timestamp::now().plus_secs(reset_secs),
        }))
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let result = RedisRateLimiter::connect("not a url", RateLimitPolicy::per_minute(60)).await;
        assert!(matches!(result, Err(RateLimitError::Unavailable(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis on localhost"]
    async fn counts_and_denies_against_live_redis() {
        let limiter = RedisRateLimiter::connect("redis://127.0.0.1/", RateLimitPolicy::per_minute(2))
            .await
            .unwrap();
        let key = RateLimitKey::api_key(&format!("redis-test-{}", uuid::Uuid::new_v4()));

        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        assert!(limiter.check(key).await.unwrap().is_denied());
    }
}
