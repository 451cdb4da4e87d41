//! Transcript of conversation turns supplied whole on every request.
//!
//! The transcript is owned by the caller. The engine validates it once at
//! the boundary and then only reads it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of turns accepted in one transcript.
pub const MAX_TURNS: usize = 200;

/// Maximum characters in a single turn.
pub const MAX_TURN_CHARS: usize = 10_000;

/// Schema violations that make a transcript unusable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Transcript is empty")]
    Empty,

    #[error("Transcript has {actual} turns, maximum is {max}")]
    TooManyTurns { max: usize, actual: usize },

    #[error("Turn {index} is {actual} characters, maximum is {max}")]
    TurnTooLong {
        index: usize,
        max: usize,
        actual: usize,
    },

    #[error("Turn {index} has unknown role '{role}'")]
    UnknownRole { index: usize, role: String },

    #[error("User turn {index} is blank")]
    BlankUserTurn { index: usize },

    #[error("Transcript contains no user turn")]
    NoUserTurn,
}

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl FromStr for TurnRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            _ => Err(()),
        }
    }
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// A validated, ordered sequence of turns.
///
/// # Invariants
///
/// - at least one turn, at most [`MAX_TURNS`]
/// - every turn at most [`MAX_TURN_CHARS`] characters
/// - at least one user turn, and no user turn is blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    /// Validates and wraps the turns.
    pub fn new(turns: Vec<ConversationTurn>) -> Result<Self, TranscriptError> {
        if turns.is_empty() {
            return Err(TranscriptError::Empty);
        }
        if turns.len() > MAX_TURNS {
            return Err(TranscriptError::TooManyTurns {
                max: MAX_TURNS,
                actual: turns.len(),
            });
        }

        for (index, turn) in turns.iter().enumerate() {
            let chars = turn.text.chars().count();
            if chars > MAX_TURN_CHARS {
                return Err(TranscriptError::TurnTooLong {
                    index,
                    max: MAX_TURN_CHARS,
                    actual: chars,
                });
            }
            if turn.role == TurnRole::User && turn.text.trim().is_empty() {
                return Err(TranscriptError::BlankUserTurn { index });
            }
        }

        if !turns.iter().any(|t| t.role == TurnRole::User) {
            return Err(TranscriptError::NoUserTurn);
        }

        Ok(Self { turns })
    }

    /// Validates raw `(role, text)` pairs as received on the wire.
    pub fn from_raw<I, R, T>(raw: I) -> Result<Self, TranscriptError>
    where
        I: IntoIterator<Item = (R, T)>,
        R: AsRef<str>,
        T: Into<String>,
    {
        let turns = raw
            .into_iter()
            .enumerate()
            .map(|(index, (role, text))| {
                let role_str = role.as_ref();
                role_str
                    .parse::<TurnRole>()
                    .map(|role| ConversationTurn {
                        role,
                        text: text.into(),
                    })
                    .map_err(|_| TranscriptError::UnknownRole {
                        index,
                        role: role_str.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(turns)
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Text of the most recent user turn.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .map(|t| t.text.as_str())
    }
}
