//! Axum routes for coaching endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{coach_stream, coach_turn, health, recommend, retrieve_debug, CoachAppState};

/// Unauthenticated routes.
///
/// - GET /health - liveness
pub fn health_routes() -> Router<CoachAppState> {
    Router::new().route("/health", get(health))
}

/// Routes that sit behind API key and rate limit middleware.
///
/// - POST /coach/turn - next question or recommendation
/// - POST /coach/stream - same, as server-sent events
/// - POST /coffee/recommend - rule engine on explicit parameters
/// - POST /retrieve/debug - raw reference retrieval
pub fn coach_routes() -> Router<CoachAppState> {
    Router::new()
        .route("/coach/turn", post(coach_turn))
        .route("/coach/stream", post(coach_stream))
        .route("/coffee/recommend", post(recommend))
        .route("/retrieve/debug", post(retrieve_debug))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_routes_creates_valid_router() {
        let _routes = health_routes();
    }

    #[test]
    fn coach_routes_creates_valid_router() {
        let _routes = coach_routes();
    }
}
