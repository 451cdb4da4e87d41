//! Scored reference passages returned by retrieval.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A passage from the knowledge base with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnippet {
    pub source_id: String,
    pub text: String,
    pub score: f64,
}

impl ReferenceSnippet {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>, score: f64) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            score,
        }
    }

    /// Descending score, then ascending source id, for a total, stable order.
    pub fn rank(a: &Self, b: &Self) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.source_id.cmp(&b.source_id))
    }
}

/// Sorts snippets best-first and keeps at most `k`.
pub fn rank_and_truncate(mut snippets: Vec<ReferenceSnippet>, k: usize) -> Vec<ReferenceSnippet> {
    snippets.sort_by(ReferenceSnippet::rank);
    snippets.truncate(k);
    snippets
}
