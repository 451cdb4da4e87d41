//! OpenAI-compatible provider - `AIProvider` over a `/chat/completions` API.
//!
//! Works against any server speaking the OpenAI chat wire format. The default
//! configuration targets a local Ollama instance serving `phi3:mini`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new()
//!     .with_model("phi3:mini")
//!     .with_base_url("http://localhost:11434/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! Uses Server-Sent Events. Each `data:` line is parsed and yielded as a
//! `StreamChunk` until the `[DONE]` marker. Dropping the returned stream drops
//! the response body and closes the connection.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    MessageRole, ProviderInfo, StreamChunk, TokenUsage,
};

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Bearer token. Local servers usually need none.
    api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            model: "phi3:mini".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            timeout: Duration::from_secs(20),
            max_retries: 1,
        }
    }

    pub fn with_api_key(mut self, api_key: Secret<String>) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

/// OpenAI-compatible API provider.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to the OpenAI wire format.
    fn to_openai_request(&self, request: &CompletionRequest, stream: bool) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: Some(stream),
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.api_key() {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<Response, AIError> {
        let body = self.to_openai_request(request, stream);

        tracing::debug!(
            trace_id = %request.trace_id,
            model = %self.config.model,
            stream,
            "sending completion request"
        );

        self.authorize(self.client.post(self.completions_url()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AIError {
        if e.is_timeout() {
            AIError::Timeout {
                timeout_secs: self.config.timeout.as_secs() as u32,
            }
        } else if e.is_connect() {
            AIError::network(format!("Connection failed: {}", e))
        } else {
            AIError::network(e.to_string())
        }
    }

    /// Maps non-success statuses to errors.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 | 404 | 422 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses "try again in Ns" from an error body, defaulting to 30 seconds.
    fn parse_retry_after(error_body: &str) -> u32 {
        serde_json::from_str::<serde_json::Value>(error_body)
            .ok()
            .and_then(|parsed| {
                let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
                let idx = message.find("try again in ")?;
                let rest = &message[idx + 13..];
                let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                rest[..end].parse::<u32>().ok()
            })
            .unwrap_or(30)
    }

    async fn parse_response(response: Response) -> Result<CompletionResponse, AIError> {
        let response = Self::handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            usage,
            model: openai_response.model,
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref()),
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut retry_count = 0;

        loop {
            let result = match self.send(&request, false).await {
                Ok(response) => Self::parse_response(response).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(completion) => return Ok(completion),
                Err(err) if !err.is_retryable() || retry_count >= self.config.max_retries => {
                    return Err(err);
                }
                Err(err) => {
                    tracing::debug!(
                        trace_id = %request.trace_id,
                        attempt = retry_count + 1,
                        error = %err,
                        "retrying completion"
                    );
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            sleep(Duration::from_secs(1 << retry_count)).await;
            retry_count += 1;
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        let response = self.send(&request, true).await?;
        let response = Self::handle_response_status(response).await?;

        let body = Box::pin(response.bytes_stream());
        let stream = stream::unfold(
            (body, SseLineBuffer::default(), false),
            |(mut body, mut buffer, finished)| async move {
                if finished {
                    return None;
                }
                match body.next().await {
                    Some(Ok(bytes)) => Some((buffer.push(&bytes), (body, buffer, false))),
                    Some(Err(e)) => Some((
                        vec![Err(AIError::network(format!("Stream error: {}", e)))],
                        (body, buffer, true),
                    )),
                    None => Some((buffer.finish(), (body, buffer, true))),
                }
            },
        )
        .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai-compatible", &self.config.model).with_streaming(true)
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

/// Carries a partial SSE line across network reads.
///
/// Only `\n`-terminated lines are decoded, so a multibyte character split
/// between two reads is reassembled before parsing.
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, AIError>> {
        self.pending.extend_from_slice(bytes);
        let Some(end) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let complete: Vec<u8> = self.pending.drain(..=end).collect();
        parse_sse_chunks(&String::from_utf8_lossy(&complete))
    }

    /// Parses whatever remains once the body ends without a trailing newline.
    fn finish(&mut self) -> Vec<Result<StreamChunk, AIError>> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.pending);
        parse_sse_chunks(&String::from_utf8_lossy(&rest))
    }
}

/// Parses SSE data lines into StreamChunks.
fn parse_sse_chunks(text: &str) -> Vec<Result<StreamChunk, AIError>> {
    let mut results = Vec::new();

    for line in text.lines() {
        let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
            continue;
        };

        if data == "[DONE]" || data.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<StreamResponseChunk>(data) {
            Ok(chunk) => {
                let Some(choice) = chunk.choices.first() else {
                    continue;
                };

                if let Some(ref content) = choice.delta.content {
                    if !content.is_empty() {
                        results.push(Ok(StreamChunk::content(content)));
                    }
                }

                if choice.finish_reason.is_some() {
                    let usage = chunk
                        .usage
                        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
                        .unwrap_or_default();
                    results.push(Ok(StreamChunk::final_chunk(
                        parse_finish_reason(choice.finish_reason.as_deref()),
                        usage,
                    )));
                }
            }
            Err(e) => results.push(Err(AIError::parse(format!(
                "Failed to parse SSE chunk: {}",
                e
            )))),
        }
    }

    results
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    choices: Vec<StreamChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RequestId;

    mod config {
        use super::*;

        #[test]
        fn defaults_target_local_server() {
            let config = OpenAIConfig::new();
            assert_eq!(config.model, "phi3:mini");
            assert_eq!(config.base_url, "http://localhost:11434/v1");
            assert!(config.api_key().is_none());
        }

        #[test]
        fn builder_works() {
            let config = OpenAIConfig::new()
                .with_api_key(Secret::new("test-key".to_string()))
                .with_model("llama3")
                .with_base_url("https://llm.internal/v1/")
                .with_timeout(Duration::from_secs(5))
                .with_max_retries(3);

            assert_eq!(config.model, "llama3");
            assert_eq!(config.base_url, "https://llm.internal/v1");
            assert_eq!(config.timeout, Duration::from_secs(5));
            assert_eq!(config.max_retries, 3);
            assert_eq!(config.api_key(), Some("test-key"));
        }
    }

    mod request {
        use super::*;

        #[test]
        fn system_prompt_comes_first() {
            let provider = OpenAIProvider::new(OpenAIConfig::new()).unwrap();
            let request = CompletionRequest::new(RequestId::new())
                .with_system_prompt("Ask for the dose only")
                .with_message(MessageRole::User, "espresso, light roast")
                .with_max_tokens(60);

            let wire = provider.to_openai_request(&request, true);
            assert_eq!(wire.messages.len(), 2);
            assert_eq!(wire.messages[0].role, "system");
            assert_eq!(wire.messages[1].role, "user");
            assert_eq!(wire.stream, Some(true));

            let json = serde_json::to_value(&wire).unwrap();
            assert_eq!(json["max_tokens"], 60);
            assert!(json.get("temperature").is_none());
        }

        #[test]
        fn completions_url_appends_path() {
            let provider =
                OpenAIProvider::new(OpenAIConfig::new().with_base_url("http://h:1/v1")).unwrap();
            assert_eq!(provider.completions_url(), "http://h:1/v1/chat/completions");
        }

        #[test]
        fn provider_info_reports_model() {
            let provider = OpenAIProvider::new(OpenAIConfig::new()).unwrap();
            let info = provider.provider_info();
            assert_eq!(info.model, "phi3:mini");
            assert!(info.supports_streaming);
        }
    }

    mod sse {
        use super::*;

        #[test]
        fn parses_content_chunk() {
            let data = r#"data: {"id":"c1","choices":[{"delta":{"content":"How"},"finish_reason":null}]}"#;
            let chunks = parse_sse_chunks(data);

            assert_eq!(chunks.len(), 1);
            let chunk = chunks[0].as_ref().unwrap();
            assert_eq!(chunk.delta, "How");
            assert!(!chunk.is_final());
        }

        #[test]
        fn parses_multiple_lines_in_one_packet() {
            let data = "data: {\"choices\":[{\"delta\":{\"content\":\"How \"}}]}\n\n\
                        data: {\"choices\":[{\"delta\":{\"content\":\"many\"}}]}\n\n";
            let deltas: Vec<String> = parse_sse_chunks(data)
                .into_iter()
                .map(|c| c.unwrap().delta)
                .collect();
            assert_eq!(deltas, vec!["How ", "many"]);
        }

        #[test]
        fn parses_final_chunk() {
            let data = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#;
            let chunks = parse_sse_chunks(data);

            assert_eq!(chunks.len(), 1);
            let chunk = chunks[0].as_ref().unwrap();
            assert!(chunk.is_final());
            assert_eq!(chunk.finish_reason, Some(FinishReason::Stop));
            assert_eq!(chunk.usage.as_ref().unwrap().total_tokens, 15);
        }

        #[test]
        fn done_marker_yields_nothing() {
            assert!(parse_sse_chunks("data: [DONE]\n").is_empty());
        }

        #[test]
        fn line_split_across_reads_is_reassembled() {
            let line = "data: {\"choices\":[{\"delta\":{\"content\":\"How many grams?\"}}]}\n\n";
            let (first, second) = line.as_bytes().split_at(30);
            let mut buffer = SseLineBuffer::default();

            assert!(buffer.push(first).is_empty());
            let chunks = buffer.push(second);

            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].as_ref().unwrap().delta, "How many grams?");
        }

        #[test]
        fn multibyte_character_split_across_reads_survives() {
            let line = "data: {\"choices\":[{\"delta\":{\"content\":\"93°C\"}}]}\n";
            let bytes = line.as_bytes();
            let split = line.find('°').unwrap() + 1;
            let mut buffer = SseLineBuffer::default();

            assert!(buffer.push(&bytes[..split]).is_empty());
            let chunks = buffer.push(&bytes[split..]);

            assert_eq!(chunks[0].as_ref().unwrap().delta, "93°C");
        }

        #[test]
        fn unterminated_final_line_is_flushed() {
            let mut buffer = SseLineBuffer::default();
            assert!(buffer
                .push(br#"data: {"choices":[{"delta":{"content":"done"}}]}"#)
                .is_empty());

            let chunks = buffer.finish();
            assert_eq!(chunks[0].as_ref().unwrap().delta, "done");
            assert!(buffer.finish().is_empty());
        }

        #[test]
        fn malformed_data_is_parse_error() {
            let chunks = parse_sse_chunks("data: {not json}\n");
            assert!(matches!(chunks[0], Err(AIError::Parse(_))));
        }
    }

    mod retry_after {
        use super::*;

        #[test]
        fn parsed_from_message() {
            let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12 seconds."}}"#;
            assert_eq!(OpenAIProvider::parse_retry_after(error), 12);
        }

        #[test]
        fn defaults_to_thirty() {
            assert_eq!(OpenAIProvider::parse_retry_after("oops"), 30);
        }
    }
}
