//! Brew Coach - conversational coffee brewing coach.
//!
//! A coaching dialogue engine: it extracts brewing parameters from a chat
//! transcript, asks for whatever is still missing, and once enough is known
//! answers with a deterministic recipe from a rule table, backed by cited
//! reference snippets. Answers can be delivered whole or streamed
//! incrementally with cancellation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
