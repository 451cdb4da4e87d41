//! HTTP retriever - client for an external similarity-search service.
//!
//! Wire format:
//!
//! ```text
//! POST {base_url}/search  {"query": "...", "k": 2}
//! 200 {"results": [{"source": "docs/espresso.md", "text": "...", "score": 0.82}]}
//! ```
//!
//! Source paths are reduced to their file name so citations stay short.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::answer::{rank_and_truncate, ReferenceSnippet};
use crate::ports::{RetrievalError, Retriever};

/// Configuration for the HTTP retriever.
#[derive(Debug, Clone)]
pub struct HttpRetrieverConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpRetrieverConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Similarity-search client.
pub struct HttpRetriever {
    config: HttpRetrieverConfig,
    client: Client,
}

impl HttpRetriever {
    pub fn new(config: HttpRetrieverConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RetrievalError::unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> RetrievalError {
        if e.is_timeout() {
            RetrievalError::timeout(self.config.timeout.as_millis() as u64)
        } else {
            RetrievalError::unavailable(e.to_string())
        }
    }
}

/// Final path component of a source, handling both separators.
fn basename(source: &str) -> &str {
    source
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(source)
}

fn into_snippets(response: SearchResponse, k: usize) -> Vec<ReferenceSnippet> {
    let snippets = response
        .results
        .into_iter()
        .map(|hit| ReferenceSnippet::new(basename(&hit.source), hit.text, hit.score))
        .collect();
    rank_and_truncate(snippets, k)
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ReferenceSnippet>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.search_url())
            .json(&SearchRequest { query, k })
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::unavailable(format!(
                "search returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::invalid_response(e.to_string()))?;

        Ok(into_snippets(parsed, k))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    source: String,
    #[serde(default)]
    text: String,
    score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("docs/brewing/espresso.md"), "espresso.md");
        assert_eq!(basename("C:\\kb\\moka.md"), "moka.md");
        assert_eq!(basename("plain.md"), "plain.md");
        assert_eq!(basename("trailing/"), "trailing/");
    }

    #[test]
    fn response_is_ranked_and_truncated() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"results":[
                {"source":"kb/a.md","text":"A","score":0.2},
                {"source":"kb/b.md","text":"B","score":0.9},
                {"source":"kb/c.md","text":"C","score":0.5}
            ]}"#,
        )
        .unwrap();

        let snippets = into_snippets(response, 2);
        let ids: Vec<&str> = snippets.iter().map(|s| s.source_id.as_str()).collect();
        assert_eq!(ids, vec!["b.md", "c.md"]);
    }

    #[test]
    fn missing_results_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(into_snippets(response, 3).is_empty());
    }

    #[test]
    fn request_serializes_query_and_k() {
        let json = serde_json::to_value(SearchRequest { query: "espresso", k: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"query": "espresso", "k": 2}));
    }

    #[test]
    fn search_url_joins_base() {
        let retriever = HttpRetriever::new(HttpRetrieverConfig::new("http://kb:9000/")).unwrap();
        assert_eq!(retriever.search_url(), "http://kb:9000/search");
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let retriever = HttpRetriever::new(
            HttpRetrieverConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500)),
        )
        .unwrap();
        let result = retriever.retrieve("espresso", 2).await;
        assert!(matches!(
            result,
            Err(RetrievalError::Unavailable(_)) | Err(RetrievalError::Timeout { .. })
        ));
    }
}
