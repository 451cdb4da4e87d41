//! Coaching HTTP adapter.

mod dto;
mod handlers;
mod routes;
mod streaming;

pub use dto::{
    ChatMessageDto, CoachTurnRequest, CoachTurnResponse, ErrorResponse, HealthResponse,
    RetrieveDebugRequest,
};
pub use handlers::{CoachApiError, CoachAppState};
pub use routes::{coach_routes, health_routes};
pub use streaming::{sse_response, DONE_MARKER};
