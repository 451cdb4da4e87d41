//! The composed answer handed to the streaming dispatcher.

use serde::Serialize;

use crate::domain::brewing::{Recipe, Slot};

/// Whether the engine is asking or recommending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    Question,
    Recommendation,
}

impl AnswerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerKind::Question => "question",
            AnswerKind::Recommendation => "recommendation",
        }
    }
}

/// Question text or recipe, matching [`AnswerKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerPayload {
    Question(String),
    Recommendation(Box<Recipe>),
}

/// A complete answer.
///
/// `citations` are unique source ids in descending score order. `need`
/// lists every missing required slot for questions and is empty for
/// recommendations. `prose` is optional generated phrasing shown before the
/// deterministic recipe text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub kind: AnswerKind,
    pub payload: AnswerPayload,
    pub citations: Vec<String>,
    pub need: Vec<Slot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prose: Option<String>,
}

impl Answer {
    pub fn recipe(&self) -> Option<&Recipe> {
        match &self.payload {
            AnswerPayload::Recommendation(recipe) => Some(recipe),
            AnswerPayload::Question(_) => None,
        }
    }

    pub fn question(&self) -> Option<&str> {
        match &self.payload {
            AnswerPayload::Question(text) => Some(text),
            AnswerPayload::Recommendation(_) => None,
        }
    }

    pub fn is_question(&self) -> bool {
        self.kind == AnswerKind::Question
    }

    /// Attaches generated prose. Blank prose is dropped.
    pub fn with_prose(mut self, prose: Option<String>) -> Self {
        self.prose = prose
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }

    /// Rendered text split into lines, in reading order.
    ///
    /// The recipe rendering is self-contained: it reads correctly with no
    /// citations and no prose.
    pub fn render_lines(&self) -> Vec<String> {
        match &self.payload {
            AnswerPayload::Question(text) => text.lines().map(str::to_string).collect(),
            AnswerPayload::Recommendation(recipe) => {
                let mut lines = Vec::new();
                if let Some(prose) = &self.prose {
                    lines.extend(prose.lines().map(str::to_string));
                    lines.push(String::new());
                }

                lines.push(format!("Dial-in {}: practical recipe", recipe.title()));

                lines.push(String::new());
                lines.push("Targets".to_string());
                lines.extend(recipe.target_lines().into_iter().map(|l| format!("- {}", l)));

                if !recipe.adjustments.is_empty() {
                    lines.push(String::new());
                    lines.push("Adjust if needed".to_string());
                    lines.extend(recipe.adjustments.iter().map(|a| format!("- {}", a)));
                }

                if !recipe.steps.is_empty() {
                    lines.push(String::new());
                    lines.push("Steps".to_string());
                    lines.extend(
                        recipe
                            .steps
                            .iter()
                            .enumerate()
                            .map(|(i, s)| format!("{}. {}: {}", i + 1, s.title, s.detail)),
                    );
                }

                if !recipe.notes.is_empty() {
                    lines.push(String::new());
                    lines.push("Notes".to_string());
                    lines.extend(recipe.notes.iter().map(|n| format!("- {}", n)));
                }

                if !self.citations.is_empty() {
                    lines.push(String::new());
                    lines.push(format!("(Sources: {})", self.citations.join(", ")));
                }
                lines
            }
        }
    }

    /// Full rendered text.
    pub fn render(&self) -> String {
        self.render_lines().join("\n")
    }
}
