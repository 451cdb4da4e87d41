//! In-memory retriever over a small YAML reference corpus.
//!
//! Scores each passage by the share of distinct query terms it contains.
//! Deterministic and dependency-free at runtime, so it backs local runs and
//! tests.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::answer::{rank_and_truncate, ReferenceSnippet};
use crate::ports::{RetrievalError, Retriever};

const SEED_CORPUS: &str = include_str!("../../../data/reference_notes.yaml");

/// A passage in the corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorpusEntry {
    pub source: String,
    pub text: String,
}

/// Errors loading a corpus file.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid corpus YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone)]
struct IndexedEntry {
    source: String,
    text: String,
    terms: BTreeSet<String>,
}

/// Keyword-overlap retriever.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetriever {
    entries: Vec<IndexedEntry>,
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl InMemoryRetriever {
    pub fn new(entries: impl IntoIterator<Item = CorpusEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| IndexedEntry {
                terms: terms(&e.text),
                source: e.source,
                text: e.text,
            })
            .collect();
        Self { entries }
    }

    /// A retriever that never finds anything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The bundled reference notes.
    pub fn seeded() -> Result<Self, CorpusError> {
        Self::from_yaml_str(SEED_CORPUS)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CorpusError> {
        if yaml.trim().is_empty() {
            return Ok(Self::empty());
        }
        let entries: Option<Vec<CorpusEntry>> = serde_yaml::from_str(yaml)?;
        Ok(Self::new(entries.unwrap_or_default()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, query: &str, k: usize) -> Vec<ReferenceSnippet> {
        let query_terms = terms(query);
        if query_terms.is_empty() || k == 0 {
            return Vec::new();
        }

        let scored = self
            .entries
            .iter()
            .filter_map(|entry| {
                let hits = query_terms.intersection(&entry.terms).count();
                if hits == 0 {
                    return None;
                }
                let score = hits as f64 / query_terms.len() as f64;
                Some(ReferenceSnippet::new(&entry.source, &entry.text, score))
            })
            .collect();

        rank_and_truncate(scored, k)
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ReferenceSnippet>, RetrievalError> {
        Ok(self.search(query, k))
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
