//! Recipe value produced by the rule engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::vocabulary::{Beverage, Machine, Roast};
use crate::domain::foundation::{round1, Range};

/// One ordered instruction in a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub title: String,
    pub detail: String,
}

impl RecipeStep {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }
}

/// A deterministic brewing recipe.
///
/// Constructed once by [`RuleEngine::recommend`](super::RuleEngine::recommend)
/// and never mutated afterwards. All ranges are inclusive with `min <= max`.
/// `rationale_tags` is ordered so that two recipes built from the same
/// parameters compare and serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub beverage: Beverage,
    pub machine: Machine,
    pub roast: Roast,
    pub dose_g: f64,
    /// Water (or beverage) mass per gram of coffee.
    pub ratio: Range,
    pub yield_g: Range,
    /// Recommended water temperature window for the roast.
    pub temperature_c: Range,
    /// The temperature to actually brew at.
    pub target_temp_c: f64,
    pub time_s: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_bar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_s: Option<Range>,
    /// Grind or pressure guidance.
    pub guidance: String,
    pub steps: Vec<RecipeStep>,
    pub adjustments: Vec<String>,
    pub notes: Vec<String>,
    pub rationale_tags: BTreeSet<String>,
}

impl Recipe {
    /// One-line heading such as `Espresso (light roast, lever espresso machine)`.
    pub fn title(&self) -> String {
        let name = self.beverage.display_name();
        let mut chars = name.chars();
        let capitalised = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!(
            "{} ({} roast, {})",
            capitalised,
            self.roast,
            self.machine.display_name()
        )
    }

    /// Target lines in reading order.
    pub fn target_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Dose: {} g", round1(self.dose_g)),
            format!("Ratio: 1:{}", self.ratio),
            format!("Yield: {} g", self.yield_g),
            format!(
                "Temperature: {} °C (window {} °C)",
                round1(self.target_temp_c),
                self.temperature_c
            ),
            format!("Time: {} s", self.time_s),
        ];
        if let Some(bar) = self.pressure_bar {
            lines.push(format!("Pressure: ~{} bar", round1(bar)));
        }
        if let Some(bloom) = self.bloom_s {
            lines.push(format!("Bloom: {} s", bloom));
        }
        lines.push(format!("Grind: {}", self.guidance));
        lines
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.rationale_tags.contains(tag)
    }
}
