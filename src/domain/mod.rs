//! Domain layer containing the coaching engine's pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (request ids, timestamps, ranges)
//! - `brewing` - Brewing vocabulary, parameters and the rule engine
//! - `conversation` - Transcript validation, extraction and slot filling
//! - `answer` - Reference snippets, answer composition and rendering

pub mod answer;
pub mod brewing;
pub mod conversation;
pub mod foundation;
