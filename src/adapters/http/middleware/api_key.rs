//! API key middleware.
//!
//! Requests must carry a configured key in the `X-API-Key` header. Keys are
//! compared in constant time. With no keys configured every request passes,
//! which is the local development mode.
//!
//! A verified key is recorded in the request extensions as [`VerifiedApiKey`]
//! so that the rate limiter can count per key instead of per address.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, Secret};
use subtle::ConstantTimeEq;

use crate::ports::RateLimitKey;

/// Header carrying the client's API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Middleware state.
pub type ApiKeyState = Arc<ApiKeys>;

/// The accepted API keys.
pub struct ApiKeys {
    keys: Vec<Secret<String>>,
}

impl ApiKeys {
    pub fn new(keys: Vec<Secret<String>>) -> Self {
        Self { keys }
    }

    /// Accept every request.
    pub fn open() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares against every configured key without short-circuiting.
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate = candidate.as_bytes();
        self.keys
            .iter()
            .fold(subtle::Choice::from(0u8), |found, key| {
                found | key.expose_secret().as_bytes().ct_eq(candidate)
            })
            .into()
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("count", &self.keys.len())
            .finish()
    }
}

/// Extension inserted for requests that presented a valid key.
#[derive(Debug, Clone)]
pub struct VerifiedApiKey(RateLimitKey);

impl VerifiedApiKey {
    pub(crate) fn from_key(key: &str) -> Self {
        Self(RateLimitKey::api_key(key))
    }

    pub fn limit_key(&self) -> &RateLimitKey {
        &self.0
    }
}

pub async fn api_key_middleware(
    State(keys): State<ApiKeyState>,
    mut request: Request,
    next: Next,
) -> Response {
    if keys.is_open() {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty());

    match presented {
        Some(key) if keys.verify(key) => {
            let verified = VerifiedApiKey::from_key(key);
            request.extensions_mut().insert(verified);
            next.run(request).await
        }
        Some(_) => unauthorized("Invalid API key"),
        None => unauthorized("API key required"),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": message,
            "code": "UNAUTHORIZED"
        })),
    )
        .into_response()
}
