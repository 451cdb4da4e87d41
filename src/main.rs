//! brew-coach HTTP server.
//!
//! Configuration comes from `BREW_COACH__*` environment variables (see
//! [`brew_coach::config`]). With none set the server listens on 0.0.0.0:8080,
//! answers from the bundled reference notes, and accepts every request.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use brew_coach::adapters::ai::OpenAIProvider;
use brew_coach::adapters::http::middleware::{ApiKeys, RateLimiterState};
use brew_coach::adapters::http::{app_router, AccessControl, CoachAppState, HttpOptions};
use brew_coach::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use brew_coach::adapters::retrieval::{HttpRetriever, HttpRetrieverConfig, InMemoryRetriever};
use brew_coach::application::CoachService;
use brew_coach::config::{AppConfig, AuthConfig, RetrievalBackend, RetrievalConfig, ServerConfig};
use brew_coach::ports::{RateLimitPolicy, Retriever};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "starting brew-coach"
    );

    let retriever = build_retriever(&config.retrieval)?;
    info!(backend = retriever.name(), "retriever ready");

    let mut service = CoachService::new(retriever, config.coach.settings());
    if config.ai.enabled {
        let provider = OpenAIProvider::new(config.ai.provider_config())?;
        info!(model = %config.ai.model, base_url = %config.ai.base_url, "generation enabled");
        service = service.with_generator(Arc::new(provider));
    }

    let api_keys = ApiKeys::new(config.auth.api_key_list());
    if api_keys.is_open() {
        warn!("no API keys configured, coaching endpoints are open");
    }
    let access = AccessControl {
        api_keys: Arc::new(api_keys),
        rate_limiter: build_rate_limiter(&config.auth).await,
    };

    let options = HttpOptions {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = app_router(CoachAppState::new(Arc::new(service)), access, &options);

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("shut down");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_retriever(config: &RetrievalConfig) -> Result<Arc<dyn Retriever>> {
    let retriever: Arc<dyn Retriever> = match config.backend {
        RetrievalBackend::Http => {
            let base_url = config.base_url.clone().unwrap_or_default();
            let http = HttpRetrieverConfig::new(base_url).with_timeout(config.timeout());
            Arc::new(HttpRetriever::new(http)?)
        }
        RetrievalBackend::InMemory => match &config.corpus_path {
            Some(path) => {
                let retriever = InMemoryRetriever::from_path(path)?;
                info!(path = %path.display(), entries = retriever.len(), "corpus loaded");
                Arc::new(retriever)
            }
            None => Arc::new(InMemoryRetriever::seeded()?),
        },
    };
    Ok(retriever)
}

async fn build_rate_limiter(auth: &AuthConfig) -> Option<RateLimiterState> {
    if !auth.rate_limiting_enabled() {
        info!("rate limiting disabled");
        return None;
    }
    let policy = RateLimitPolicy::per_minute(auth.rate_limit_per_minute);

    if let Some(url) = &auth.redis_url {
        match RedisRateLimiter::connect(url, policy).await {
            Ok(limiter) => {
                info!("using Redis rate limiter");
                return Some(Arc::new(limiter));
            }
            Err(e) => warn!(error = %e, "Redis unavailable, using in-process rate limiter"),
        }
    }
    Some(Arc::new(InMemoryRateLimiter::new(policy)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
