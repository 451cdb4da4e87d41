//! HTTP DTOs for coaching endpoints.

use serde::{Deserialize, Serialize};

use crate::application::{AnswerMeta, CoachTurnCommand, RawTurn};
use crate::domain::answer::Answer;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One message of the conversation so far.
///
/// `role` is kept as free text so that an unknown role is reported as a
/// malformed transcript rather than a JSON error.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageDto {
    pub role: String,
    pub content: String,
}

/// Body of `POST /coach/turn` and `POST /coach/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoachTurnRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessageDto>,
}

impl From<CoachTurnRequest> for CoachTurnCommand {
    fn from(request: CoachTurnRequest) -> Self {
        CoachTurnCommand::new(
            request
                .messages
                .into_iter()
                .map(|m| RawTurn::new(m.role, m.content))
                .collect(),
        )
    }
}

/// Body of `POST /retrieve/debug`.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveDebugRequest {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    2
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response of `POST /coach/turn`.
#[derive(Debug, Clone, Serialize)]
pub struct CoachTurnResponse {
    /// Rendered answer text
    pub reply: String,
    #[serde(flatten)]
    pub meta: AnswerMeta,
}

impl From<&Answer> for CoachTurnResponse {
    fn from(answer: &Answer) -> Self {
        Self {
            reply: answer.render(),
            meta: AnswerMeta::from_answer(answer),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn malformed_transcript(message: impl Into<String>) -> Self {
        Self {
            code: "MALFORMED_TRANSCRIPT".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn unavailable(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::answer::AnswerComposer;
    use crate::domain::brewing::Slot;

    #[test]
    fn turn_request_deserializes() {
        let json = r#"{"messages": [{"role": "user", "content": "espresso please"}]}"#;
        let request: CoachTurnRequest = serde_json::from_str(json).unwrap();
        let command: CoachTurnCommand = request.into();
        assert_eq!(command.messages, vec![RawTurn::new("user", "espresso please")]);
    }

    #[test]
    fn turn_request_without_messages_is_empty() {
        let request: CoachTurnRequest = serde_json::from_str("{}").unwrap();
        assert!(request.messages.is_empty());
    }

    #[test]
    fn retrieve_request_defaults_k() {
        let request: RetrieveDebugRequest = serde_json::from_str(r#"{"query": "bloom"}"#).unwrap();
        assert_eq!(request.k, 2);
    }

    #[test]
    fn question_response_flattens_meta() {
        let answer = AnswerComposer::new()
            .compose_question("How many grams of coffee are you dosing?", vec![Slot::DoseG]);
        let json = serde_json::to_value(CoachTurnResponse::from(&answer)).unwrap();

        assert_eq!(json["kind"], "question");
        assert_eq!(json["need"], serde_json::json!(["dose_g"]));
        assert_eq!(json["sources"], serde_json::json!([]));
        assert!(json.get("recipe").is_none());
        assert_eq!(json["reply"], answer.render());
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::malformed_transcript("empty")).unwrap();
        assert_eq!(json["code"], "MALFORMED_TRANSCRIPT");
        assert!(json.get("details").is_none());
    }
}
