//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests and local runs to exercise the phrasing paths without a
//! model server.
//!
//! # Features
//!
//! - Pre-configured responses
//! - Simulated delays for timeout testing
//! - Error injection, including failures part way through a stream
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response("How many grams are you dosing?")
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = provider.complete(request).await?;
//! assert_eq!(response.content, "How many grams are you dosing?");
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    /// Simulated latency per request, and between streamed chunks.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success {
        content: String,
        finish_reason: FinishReason,
    },
    /// Stream the first `after_words` words of `content`, then fail.
    Interrupted {
        content: String,
        after_words: usize,
        error: MockError,
    },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Splits text into word chunks that concatenate back to the original.
fn word_chunks(content: &str) -> Vec<String> {
    content.split_inclusive(' ').map(str::to_string).collect()
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1").with_streaming(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: content.into(),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Adds a stream that fails after `after_words` words.
    pub fn with_interrupted_stream(
        self,
        content: impl Into<String>,
        after_words: usize,
        error: MockError,
    ) -> Self {
        self.push(MockResponse::Interrupted {
            content: content.into(),
            after_words,
            error,
        })
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    fn push(self, response: MockResponse) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Gets the next response or a default.
    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
                finish_reason: FinishReason::Stop,
            })
    }

    async fn record(&self, request: CompletionRequest) {
        lock(&self.calls).push(request);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    fn paced(&self, chunks: Vec<Result<StreamChunk, AIError>>) -> ChunkStream {
        let delay = self.delay;
        Box::pin(stream::iter(chunks).then(move |chunk| async move {
            if !delay.is_zero() {
                sleep(delay / 10).await;
            }
            chunk
        }))
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        self.record(request).await;

        match self.next_response() {
            MockResponse::Success {
                content,
                finish_reason,
            } => {
                let usage = TokenUsage::new(10, word_chunks(&content).len() as u32);
                Ok(CompletionResponse {
                    content,
                    usage,
                    model: self.info.model.clone(),
                    finish_reason,
                })
            }
            MockResponse::Interrupted { error, .. } | MockResponse::Error(error) => {
                Err(error.into())
            }
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        self.record(request).await;

        match self.next_response() {
            MockResponse::Success {
                content,
                finish_reason,
            } => {
                let words = word_chunks(&content);
                let usage = TokenUsage::new(10, words.len() as u32);
                let mut chunks: Vec<Result<StreamChunk, AIError>> = words
                    .into_iter()
                    .map(|w| Ok(StreamChunk::content(w)))
                    .collect();
                chunks.push(Ok(StreamChunk::final_chunk(finish_reason, usage)));
                Ok(self.paced(chunks))
            }
            MockResponse::Interrupted {
                content,
                after_words,
                error,
            } => {
                let mut chunks: Vec<Result<StreamChunk, AIError>> = word_chunks(&content)
                    .into_iter()
                    .take(after_words)
                    .map(|w| Ok(StreamChunk::content(w)))
                    .collect();
                chunks.push(Err(error.into()));
                Ok(self.paced(chunks))
            }
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RequestId;
    use crate::ports::MessageRole;

    fn test_request() -> CompletionRequest {
        CompletionRequest::new(RequestId::new()).with_message(MessageRole::User, "espresso")
    }

    async fn collect(mut stream: ChunkStream) -> (String, Option<AIError>, bool) {
        let mut content = String::new();
        let mut error = None;
        let mut finished = false;
        while let Some(result) = stream.next().await {
            match result {
                Ok(chunk) if chunk.is_final() => finished = true,
                Ok(chunk) => content.push_str(&chunk.delta),
                Err(err) => error = Some(err),
            }
        }
        (content, error, finished)
    }

    mod complete {
        use super::*;

        #[tokio::test]
        async fn returns_configured_response() {
            let provider = MockAIProvider::new().with_response("Which roast?");
            let response = provider.complete(test_request()).await.unwrap();

            assert_eq!(response.content, "Which roast?");
            assert_eq!(response.model, "mock-model-1");
            assert_eq!(response.finish_reason, FinishReason::Stop);
        }

        #[tokio::test]
        async fn returns_responses_in_order_then_default() {
            let provider = MockAIProvider::new().with_response("First").with_response("Second");

            assert_eq!(provider.complete(test_request()).await.unwrap().content, "First");
            assert_eq!(provider.complete(test_request()).await.unwrap().content, "Second");
            assert_eq!(provider.complete(test_request()).await.unwrap().content, "Mock response");
        }

        #[tokio::test]
        async fn returns_configured_error() {
            let provider =
                MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });
            let err = provider.complete(test_request()).await.unwrap_err();
            assert!(matches!(err, AIError::RateLimited { retry_after_secs: 30 }));
        }

        #[tokio::test]
        async fn tracks_calls() {
            let provider = MockAIProvider::new();
            assert_eq!(provider.call_count(), 0);

            provider.complete(test_request()).await.unwrap();
            provider.complete(test_request()).await.unwrap();
            assert_eq!(provider.call_count(), 2);
            assert_eq!(provider.get_calls()[0].messages[0].content, "espresso");

            provider.clear_calls();
            assert_eq!(provider.call_count(), 0);
        }

        #[tokio::test]
        async fn respects_delay() {
            let provider = MockAIProvider::new().with_delay(Duration::from_millis(50));
            let start = std::time::Instant::now();
            provider.complete(test_request()).await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(50));
        }
    }

    mod streaming {
        use super::*;

        #[tokio::test]
        async fn chunks_concatenate_to_content() {
            let provider = MockAIProvider::new().with_response("How many grams of coffee?");
            let stream = provider.stream_complete(test_request()).await.unwrap();

            let (content, error, finished) = collect(stream).await;
            assert_eq!(content, "How many grams of coffee?");
            assert!(error.is_none());
            assert!(finished);
        }

        #[tokio::test]
        async fn interrupted_stream_fails_after_prefix() {
            let provider = MockAIProvider::new().with_interrupted_stream(
                "one two three four",
                2,
                MockError::Network {
                    message: "reset".to_string(),
                },
            );
            let stream = provider.stream_complete(test_request()).await.unwrap();

            let (content, error, finished) = collect(stream).await;
            assert_eq!(content, "one two ");
            assert!(matches!(error, Some(AIError::Network(_))));
            assert!(!finished);
        }

        #[tokio::test]
        async fn error_before_stream() {
            let provider = MockAIProvider::new().with_error(MockError::Unavailable {
                message: "down".to_string(),
            });
            match provider.stream_complete(test_request()).await {
                Ok(_) => panic!("expected error"),
                Err(err) => assert!(matches!(err, AIError::Unavailable { .. })),
            }
        }
    }

    #[test]
    fn custom_provider_info() {
        let provider = MockAIProvider::new()
            .with_provider_info(ProviderInfo::new("custom", "tiny").with_streaming(false));
        let info = provider.provider_info();
        assert_eq!(info.name, "custom");
        assert!(!info.supports_streaming);
    }

    #[test]
    fn mock_error_converts_to_ai_error() {
        let err: AIError = MockError::AuthenticationFailed.into();
        assert!(matches!(err, AIError::AuthenticationFailed));

        let err: AIError = MockError::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, AIError::Timeout { timeout_secs: 30 }));
    }
}
