//! Slot-filling state machine.
//!
//! The dialogue state is recomputed from the extracted parameters on every
//! request. There is no session object: a transcript either carries every
//! required slot for its beverage (`Ready`) or it does not (`Incomplete`).

use serde::Serialize;

use crate::domain::brewing::{Beverage, BrewingParameters, Slot};

const ESPRESSO_SLOTS: &[Slot] = &[
    Slot::DoseG,
    Slot::WaterTempC,
    Slot::PressureBar,
    Slot::Roast,
    Slot::Machine,
];

const FILTER_SLOTS: &[Slot] = &[Slot::DoseG, Slot::Roast];

const UNKNOWN_BEVERAGE_SLOTS: &[Slot] = &[Slot::Beverage, Slot::DoseG];

/// Ordered slots that must be present before recommending.
///
/// Order is question priority: the first missing slot is asked first.
pub struct RequiredSlotSet;

impl RequiredSlotSet {
    /// Required slots for a beverage, or for a not-yet-known one.
    ///
    /// Never empty. An unknown beverage always starts with `Slot::Beverage`.
    pub fn for_beverage(beverage: Option<Beverage>) -> &'static [Slot] {
        match beverage {
            None => UNKNOWN_BEVERAGE_SLOTS,
            Some(b) if b.is_espresso_based() => ESPRESSO_SLOTS,
            // Water temperature defaults from the roast window for these.
            Some(_) => FILTER_SLOTS,
        }
    }
}

/// Outcome of evaluating parameters against the required slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    /// At least one required slot is missing. `missing` is in priority order
    /// and never empty.
    Incomplete {
        beverage: Option<Beverage>,
        missing: Vec<Slot>,
    },
    /// Every required slot is present.
    Ready { beverage: Beverage },
}

impl DialogueState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DialogueState::Ready { .. })
    }

    /// The single slot to ask about next.
    pub fn next_slot(&self) -> Option<Slot> {
        match self {
            DialogueState::Incomplete { missing, .. } => missing.first().copied(),
            DialogueState::Ready { .. } => None,
        }
    }

    pub fn missing(&self) -> &[Slot] {
        match self {
            DialogueState::Incomplete { missing, .. } => missing,
            DialogueState::Ready { .. } => &[],
        }
    }

    pub fn beverage(&self) -> Option<Beverage> {
        match self {
            DialogueState::Incomplete { beverage, .. } => *beverage,
            DialogueState::Ready { beverage } => Some(*beverage),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Incomplete { .. } => "incomplete",
            DialogueState::Ready { .. } => "ready",
        }
    }
}

/// Decides whether to ask a follow-up question or recommend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotFillingMachine;

impl SlotFillingMachine {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, params: &BrewingParameters) -> DialogueState {
        let beverage = params.effective_beverage();
        let missing: Vec<Slot> = RequiredSlotSet::for_beverage(beverage)
            .iter()
            .copied()
            .filter(|slot| !params.has(*slot))
            .collect();

        match (beverage, missing.is_empty()) {
            (Some(beverage), true) => DialogueState::Ready { beverage },
            _ => DialogueState::Incomplete { beverage, missing },
        }
    }

    /// Deterministic question text for one slot.
    ///
    /// Each question mentions only its own slot, so a bare answer in the
    /// following user turn can be attributed to it.
    pub fn question(&self, slot: Slot, beverage: Option<Beverage>) -> String {
        match slot {
            Slot::Beverage => "Which drink are you making: espresso, americano, cappuccino, latte, \
                               pourover, aeropress, french press or moka?"
                .to_string(),
            Slot::Machine => {
                "Which espresso machine are you using: pump, lever or pod?".to_string()
            }
            Slot::Roast => match beverage {
                Some(b) => format!(
                    "What roast level are the beans for your {}: light, medium or dark?",
                    b.display_name()
                ),
                None => "What roast level are the beans: light, medium or dark?".to_string(),
            },
            Slot::DoseG => "How many grams of coffee are you dosing?".to_string(),
            Slot::WaterTempC => "What water temperature are you using, in °C?".to_string(),
            Slot::PressureBar => "What brew pressure are you pulling at, in bar?".to_string(),
        }
    }
}
