//! Rate limiting middleware for axum.
//!
//! Counts requests per verified API key, or per client address when the
//! request carries no verified key. Limiter failures are logged and the
//! request is let through.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::api_key::VerifiedApiKey;
use crate::ports::{RateLimitKey, RateLimitResult, RateLimiter};

/// Rate limiter middleware state.
pub type RateLimiterState = Arc<dyn RateLimiter>;

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let key = limit_key(&request, connect_info.as_ref());

    match limiter.check(key).await {
        Ok(RateLimitResult::Denied(denied)) => {
            tracing::info!(
                scope = denied.scope.as_str(),
                retry_after_secs = denied.retry_after_secs,
                "rate limit exceeded"
            );
            rate_limit_response(denied.limit, denied.retry_after_secs)
        }
        Ok(RateLimitResult::Allowed(status)) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(
                &mut response,
                status.limit,
                status.remaining,
                status.reset_at.as_unix_secs(),
            );
            response
        }
        Err(e) => {
            tracing::warn!(error = %e, "rate limiter unavailable, allowing request");
            next.run(request).await
        }
    }
}

fn limit_key<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> RateLimitKey {
    if let Some(verified) = request.extensions().get::<VerifiedApiKey>() {
        return verified.limit_key().clone();
    }
    let ip = extract_client_ip(request, connect_info).unwrap_or_else(|| "unknown".to_string());
    RateLimitKey::ip(&ip)
}

/// Extract client IP from request, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("X-Forwarded-For") {
        if let Some(first_ip) = forwarded.split(',').next() {
            return Some(first_ip.trim().to_string());
        }
    }

    if let Some(real_ip) = header("X-Real-IP") {
        return Some(real_ip.to_string());
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

/// Create a 429 Too Many Requests response.
fn rate_limit_response(limit: u32, retry_after_secs: u32) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "Rate limit exceeded",
            "code": "RATE_LIMIT_EXCEEDED",
            "retry_after_secs": retry_after_secs
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));

    response
}

fn add_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32, reset_at: u64) {
    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
    headers.insert(headers::X_RATELIMIT_RESET.clone(), HeaderValue::from(reset_at));
}
