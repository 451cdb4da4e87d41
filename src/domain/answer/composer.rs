//! Answer composition: merges rule output with retrieved references.

use std::collections::HashSet;

use super::answer::{Answer, AnswerKind, AnswerPayload};
use super::snippet::ReferenceSnippet;
use crate::domain::brewing::{Recipe, Slot};

/// Builds [`Answer`] values. Pure and stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerComposer;

impl AnswerComposer {
    pub fn new() -> Self {
        Self
    }

    /// A recommendation citing the deduplicated snippet sources.
    ///
    /// An empty snippet list yields an answer with no citations; the recipe
    /// is never withheld.
    pub fn compose_recommendation(&self, recipe: Recipe, snippets: &[ReferenceSnippet]) -> Answer {
        let citations = Self::dedup_by_source(snippets)
            .into_iter()
            .map(|s| s.source_id)
            .collect();

        Answer {
            kind: AnswerKind::Recommendation,
            payload: AnswerPayload::Recommendation(Box::new(recipe)),
            citations,
            need: Vec::new(),
            prose: None,
        }
    }

    /// A follow-up question. `need` is every missing slot, highest priority first.
    pub fn compose_question(&self, question: impl Into<String>, need: Vec<Slot>) -> Answer {
        Answer {
            kind: AnswerKind::Question,
            payload: AnswerPayload::Question(question.into()),
            citations: Vec::new(),
            need,
            prose: None,
        }
    }

    /// Keeps the highest-scoring snippet per source, best first.
    pub fn dedup_by_source(snippets: &[ReferenceSnippet]) -> Vec<ReferenceSnippet> {
        let mut ranked = snippets.to_vec();
        ranked.sort_by(ReferenceSnippet::rank);

        let mut seen = HashSet::new();
        ranked
            .into_iter()
            .filter(|s| seen.insert(s.source_id.clone()))
            .collect()
    }
}
