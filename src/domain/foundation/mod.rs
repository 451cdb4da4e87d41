//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers, time and numeric value objects that the
//! brewing, conversation and answer modules build on.

mod ids;
mod range;
mod timestamp;

pub use ids::RequestId;
pub use range::{round1, Range};
pub use timestamp::Timestamp;
