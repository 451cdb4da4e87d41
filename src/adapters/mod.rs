//! Adapters - implementations of ports and the HTTP surface.
//!
//! - `ai` - generation collaborators
//! - `retrieval` - reference snippet backends
//! - `rate_limiter` - request counters
//! - `http` - axum router, handlers and middleware

pub mod ai;
pub mod http;
pub mod rate_limiter;
pub mod retrieval;
