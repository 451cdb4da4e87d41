//! Rate limiter adapters.
//!
//! Implementations of the RateLimiter port for different backends.
//!
//! - `InMemoryRateLimiter` - single process, also used by tests
//! - `RedisRateLimiter` - shared counters for multi-instance deployments
//!
//! ```ignore
//! use brew_coach::adapters::rate_limiter::InMemoryRateLimiter;
//! use brew_coach::ports::RateLimitPolicy;
//!
//! let limiter = InMemoryRateLimiter::new(RateLimitPolicy::per_minute(60));
//! ```

mod in_memory;
mod redis;

pub use in_memory::InMemoryRateLimiter;
pub use self::redis::RedisRateLimiter;
