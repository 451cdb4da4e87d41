//! HTTP handlers for coaching endpoints.
//!
//! Handlers translate HTTP requests into [`CoachService`] calls and map
//! results back to responses.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{
    CoachTurnRequest, CoachTurnResponse, ErrorResponse, HealthResponse, RetrieveDebugRequest,
};
use super::streaming::sse_response;
use crate::application::{CoachError, CoachService};
use crate::domain::answer::ReferenceSnippet;
use crate::domain::brewing::{BrewingParameters, Recipe};

/// Shared state for coaching handlers.
#[derive(Clone)]
pub struct CoachAppState {
    pub service: Arc<CoachService>,
}

impl CoachAppState {
    pub fn new(service: Arc<CoachService>) -> Self {
        Self { service }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Error type for coaching endpoints.
#[derive(Debug)]
pub struct CoachApiError(CoachError);

impl From<CoachError> for CoachApiError {
    fn from(err: CoachError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CoachApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            CoachError::MalformedTranscript(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::malformed_transcript(e.to_string()),
            ),
            CoachError::RetrievalUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::unavailable("RETRIEVAL_UNAVAILABLE", message.clone()),
            ),
            CoachError::GenerationUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::unavailable("GENERATION_UNAVAILABLE", message.clone()),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /coach/turn
pub async fn coach_turn(
    State(state): State<CoachAppState>,
    Json(request): Json<CoachTurnRequest>,
) -> Result<Json<CoachTurnResponse>, CoachApiError> {
    let answer = state.service.turn(request.into()).await?;
    Ok(Json(CoachTurnResponse::from(&answer)))
}

/// POST /coach/stream
pub async fn coach_stream(
    State(state): State<CoachAppState>,
    Json(request): Json<CoachTurnRequest>,
) -> Result<Response, CoachApiError> {
    let stream = state.service.stream(request.into()).await?;
    Ok(sse_response(stream))
}

/// POST /coffee/recommend
pub async fn recommend(
    State(state): State<CoachAppState>,
    Json(params): Json<BrewingParameters>,
) -> Json<Recipe> {
    Json(state.service.recommend(&params))
}

/// POST /retrieve/debug
pub async fn retrieve_debug(
    State(state): State<CoachAppState>,
    Json(request): Json<RetrieveDebugRequest>,
) -> Result<Json<Vec<ReferenceSnippet>>, CoachApiError> {
    let snippets = state
        .service
        .retrieve_debug(&request.query, request.k)
        .await?;
    Ok(Json(snippets))
}
