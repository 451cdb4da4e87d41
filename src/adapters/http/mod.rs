//! HTTP adapters - REST and SSE endpoints over the coaching service.

pub mod coach;
pub mod middleware;

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use coach::CoachAppState;

use coach::{coach_routes, health_routes};
use middleware::{api_key_middleware, rate_limit_middleware, ApiKeyState, RateLimiterState};

/// Cross-cutting HTTP settings.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub request_timeout: Duration,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Access control applied to the coaching routes.
pub struct AccessControl {
    pub api_keys: ApiKeyState,
    /// `None` disables rate limiting.
    pub rate_limiter: Option<RateLimiterState>,
}

/// Full application router.
///
/// `/health` is public. Coaching routes pass the API key check first, then
/// the rate limiter.
pub fn app_router(state: CoachAppState, access: AccessControl, options: &HttpOptions) -> Router {
    let mut protected = coach_routes();
    if let Some(limiter) = access.rate_limiter {
        protected = protected.route_layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }
    let protected = protected.route_layer(axum::middleware::from_fn_with_state(
        access.api_keys,
        api_key_middleware,
    ));

    Router::new()
        .merge(health_routes())
        .merge(protected)
        .with_state(state)
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(cors_layer(&options.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
