//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `BREW_COACH` prefix and
//! nested values are separated by double underscores. Every section has
//! defaults, so the service starts with no configuration at all.
//!
//! # Example
//!
//! ```no_run
//! use brew_coach::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod ai;
mod auth;
mod coach;
mod error;
mod retrieval;
mod server;

pub use ai::AiConfig;
pub use auth::AuthConfig;
pub use coach::CoachConfig;
pub use error::{ConfigError, ValidationError};
pub use retrieval::{RetrievalBackend, RetrievalConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Generation collaborator (OpenAI-compatible server)
    #[serde(default)]
    pub ai: AiConfig,

    /// Reference retrieval backend
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Dialogue tuning
    #[serde(default)]
    pub coach: CoachConfig,

    /// API keys and rate limiting
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BREW_COACH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `BREW_COACH__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BREW_COACH__RETRIEVAL__BACKEND=http` -> `retrieval.backend = http`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BREW_COACH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.retrieval.validate()?;
        self.coach.validate()?;
        self.auth.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
