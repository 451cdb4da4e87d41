//! Conversation domain module.
//!
//! Validates the caller's transcript, folds it into brewing parameters and
//! decides whether the dialogue is ready for a recommendation.

mod extractor;
mod slots;
mod transcript;

pub use extractor::{pending_slot, ParameterExtractor};
pub use slots::{DialogueState, RequiredSlotSet, SlotFillingMachine};
pub use transcript::{
    ConversationTurn, Transcript, TranscriptError, TurnRole, MAX_TURNS, MAX_TURN_CHARS,
};
