//! Application layer - orchestration over the coaching domain and ports.
//!
//! - `CoachService` - turn, stream, recommend and debug retrieval
//! - `StreamingDispatcher` - cancellable incremental delivery

mod coach_service;
mod dispatcher;

pub use coach_service::{
    CoachError, CoachService, CoachSettings, CoachTurnCommand, RawTurn, MAX_RETRIEVAL_K,
};
pub use dispatcher::{line_increments, AnswerMeta, AnswerStream, StreamEvent, StreamingDispatcher};
