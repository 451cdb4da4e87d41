//! HTTP middleware for axum.
//!
//! - `api_key` - `X-API-Key` verification
//! - `rate_limit` - fixed-window limiting per key or client address

pub mod api_key;
pub mod rate_limit;

pub use api_key::{api_key_middleware, ApiKeyState, ApiKeys, VerifiedApiKey, API_KEY_HEADER};
pub use rate_limit::{rate_limit_middleware, RateLimiterState};
