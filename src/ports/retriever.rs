//! Retriever port - Interface to the similarity-search collaborator.
//!
//! The knowledge base is populated elsewhere; the coaching engine only asks
//! it for passages. Results are advisory: an empty list or an error never
//! blocks a recommendation.

use async_trait::async_trait;

use crate::domain::answer::ReferenceSnippet;

/// Port for ranked passage retrieval.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns at most `k` snippets, best first.
    ///
    /// Implementations must return identical output for identical `query`
    /// and `k` given an unchanged backend.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ReferenceSnippet>, RetrievalError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Retrieval failures. All of them are recoverable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Backend could not be reached or returned a server error.
    #[error("retrieval backend unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer in time.
    #[error("retrieval timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Backend answered with something we could not read.
    #[error("invalid retrieval response: {0}")]
    InvalidResponse(String),
}

impl RetrievalError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}
