//! In-memory rate limiter for tests and single-process deployments.
//!
//! Uses a fixed-window counter algorithm with an in-memory HashMap.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult,
    RateLimitStatus, RateLimiter,
};

/// In-memory fixed-window rate limiter.
///
/// Each key tracks a request count and resets when its window expires.
/// Expired windows are swept at most once per window length.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    windows: Arc<RwLock<Windows>>,
}

#[derive(Debug, Default)]
struct Windows {
    by_key: HashMap<String, WindowState>,
    last_sweep: u64,
}

impl Windows {
    fn sweep(&mut self, now: u64, window_secs: u64) {
        if now < self.last_sweep + window_secs {
            return;
        }
        self.by_key
            .retain(|_, state| now < state.window_start + window_secs);
        self.last_sweep = now;
    }
}

#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: u64,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Arc::new(RwLock::new(Windows::default())),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    async fn check_at(&self, key: RateLimitKey, now: u64) -> RateLimitResult {
        let RateLimitPolicy { limit, window_secs } = self.policy;
        let window_secs = window_secs as u64;

        let mut windows = self.windows.write().await;
        windows.sweep(now, window_secs);
        let state = windows
            .by_key
            .entry(key.to_redis_key())
            .or_insert_with(|| WindowState {
                count: 0,
                window_start: now,
            });

        if now >= state.window_start + window_secs {
            state.count = 0;
            state.window_start = now;
        }

        let window_end = state.window_start + window_secs;

        if state.count >= limit {
            let retry_after = window_end.saturating_sub(now) as u32;
            return RateLimitResult::Denied(RateLimitDenied::new(limit, retry_after, key.scope));
        }

        state.count += 1;

        RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_at: Timestamp::from_unix_secs(window_end),
        })
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_at(key, Timestamp::now().as_unix_secs()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RateLimitScope;

    fn limiter(limit: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitPolicy::per_minute(limit))
    }

    mod window {
        use super::*;

        #[tokio::test]
        async fn allows_requests_within_limit() {
            let limiter = limiter(10);
            let key = RateLimitKey::api_key("k1");

            for i in 0..10 {
                let result = limiter.check(key.clone()).await.unwrap();
                assert!(result.is_allowed(), "request {} should be allowed", i + 1);
            }
        }

        #[tokio::test]
        async fn denies_requests_at_limit() {
            let limiter = limiter(5);
            let key = RateLimitKey::ip("192.168.1.1");

            for _ in 0..5 {
                assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
            }

            match limiter.check(key).await.unwrap() {
                RateLimitResult::Denied(denied) => {
                    assert_eq!(denied.limit, 5);
                    assert!(denied.retry_after_secs >= 1);
                    assert_eq!(denied.scope, RateLimitScope::Ip);
                }
                other => panic!("expected denial, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn remaining_decrements() {
            let limiter = limiter(3);
            let key = RateLimitKey::api_key("k2");

            for expected in [2, 1, 0] {
                match limiter.check(key.clone()).await.unwrap() {
                    RateLimitResult::Allowed(status) => assert_eq!(status.remaining, expected),
                    other => panic!("expected allowed, got {:?}", other),
                }
            }
        }

        #[tokio::test]
        async fn window_expiry_restores_quota() {
            let limiter = limiter(1);
            let key = RateLimitKey::ip("10.0.0.3");

            assert!(limiter.check_at(key.clone(), 1_000).await.is_allowed());
            assert!(limiter.check_at(key.clone(), 1_030).await.is_denied());
            assert!(limiter.check_at(key, 1_060).await.is_allowed());
        }

        #[tokio::test]
        async fn zero_limit_denies_everything() {
            let limiter = limiter(0);
            assert!(limiter.check(RateLimitKey::ip("x")).await.unwrap().is_denied());
        }
    }

    mod keys {
        use super::*;

        #[tokio::test]
        async fn expired_windows_are_swept() {
            let limiter = limiter(5);
            for i in 0..100 {
                limiter
                    .check_at(RateLimitKey::ip(&format!("10.0.1.{}", i)), 1_000)
                    .await;
            }
            assert_eq!(limiter.windows.read().await.by_key.len(), 100);

            limiter.check_at(RateLimitKey::ip("10.0.2.1"), 1_061).await;
            assert_eq!(limiter.windows.read().await.by_key.len(), 1);
        }

        #[tokio::test]
        async fn live_windows_survive_a_sweep() {
            let limiter = limiter(1);
            let key = RateLimitKey::ip("10.0.0.2");

            limiter.check_at(RateLimitKey::ip("10.0.0.8"), 1_000).await;
            assert!(limiter.check_at(key.clone(), 1_030).await.is_allowed());
            limiter.check_at(RateLimitKey::ip("10.0.0.9"), 1_065).await;

            assert_eq!(limiter.windows.read().await.by_key.len(), 2);
            assert!(limiter.check_at(key, 1_080).await.is_denied());
        }

        #[tokio::test]
        async fn different_keys_are_independent() {
            let limiter = limiter(1);
            let a = RateLimitKey::api_key("alpha");
            let b = RateLimitKey::api_key("beta");

            limiter.check(a.clone()).await.unwrap();
            assert!(limiter.check(a).await.unwrap().is_denied());
            assert!(limiter.check(b).await.unwrap().is_allowed());
        }
    }
}
