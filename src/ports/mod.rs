//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the coaching domain and the outside world. Adapters implement these ports.
//!
//! - `Retriever` - reference snippets for a retrieval query
//! - `AIProvider` - optional phrasing of questions and recipe intros
//! - `RateLimiter` - per-client request quotas for the HTTP surface

mod ai_provider;
mod rate_limiter;
mod retriever;

pub use ai_provider::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    Message, MessageRole, ProviderInfo, StreamChunk, TokenUsage,
};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitPolicy, RateLimitResult,
    RateLimitScope, RateLimitStatus, RateLimiter,
};
pub use retriever::{RetrievalError, Retriever};
