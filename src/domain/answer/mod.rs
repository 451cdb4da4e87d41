//! Answer domain - Snippets, composed answers and their rendering.

mod answer;
mod composer;
mod snippet;

pub use answer::{Answer, AnswerKind, AnswerPayload};
pub use composer::AnswerComposer;
pub use snippet::{rank_and_truncate, ReferenceSnippet};
