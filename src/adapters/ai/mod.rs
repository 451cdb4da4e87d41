//! AI Provider Adapters.
//!
//! - `OpenAIProvider` - any OpenAI-compatible chat completions server
//! - `MockAIProvider` - configurable mock for tests and offline runs

mod mock_provider;
mod openai_provider;

pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
