//! Partially-filled brewing parameter record and its slots.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::vocabulary::{Beverage, Machine, Roast};

/// A named field of [`BrewingParameters`] that may be required before recommending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Beverage,
    Machine,
    Roast,
    DoseG,
    WaterTempC,
    PressureBar,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Beverage => "beverage",
            Slot::Machine => "machine",
            Slot::Roast => "roast",
            Slot::DoseG => "dose_g",
            Slot::WaterTempC => "water_temp_c",
            Slot::PressureBar => "pressure_bar",
        }
    }

    /// Short label with its unit, as shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Slot::Beverage => "beverage",
            Slot::Machine => "machine",
            Slot::Roast => "roast level",
            Slot::DoseG => "dose (g)",
            Slot::WaterTempC => "brew temperature (°C)",
            Slot::PressureBar => "brew pressure (bar)",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stated coffee-to-water ratio such as `1:2.2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrewRatio {
    pub coffee: f64,
    pub water: f64,
}

impl BrewRatio {
    pub fn new(coffee: f64, water: f64) -> Self {
        Self { coffee, water }
    }

    /// Water mass per unit of coffee, or `None` for a degenerate ratio.
    pub fn multiplier(&self) -> Option<f64> {
        if self.coffee > 0.0 && self.water > 0.0 && self.coffee.is_finite() && self.water.is_finite()
        {
            Some(self.water / self.coffee)
        } else {
            None
        }
    }
}

impl fmt::Display for BrewRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.coffee, self.water)
    }
}

/// Brewing parameters extracted from a conversation.
///
/// Every field is independently present or absent. The record is rebuilt
/// from the full transcript on each request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrewingParameters {
    pub beverage: Option<Beverage>,
    pub machine: Option<Machine>,
    pub roast: Option<Roast>,
    pub dose_g: Option<f64>,
    pub yield_g: Option<f64>,
    pub water_temp_c: Option<f64>,
    pub pressure_bar: Option<f64>,
    pub ratio: Option<BrewRatio>,
    pub extraction_time_s: Option<f64>,
}

impl BrewingParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_beverage(mut self, beverage: Beverage) -> Self {
        self.beverage = Some(beverage);
        self
    }

    pub fn with_machine(mut self, machine: Machine) -> Self {
        self.machine = Some(machine);
        self
    }

    pub fn with_roast(mut self, roast: Roast) -> Self {
        self.roast = Some(roast);
        self
    }

    pub fn with_dose(mut self, grams: f64) -> Self {
        self.dose_g = Some(grams);
        self
    }

    pub fn with_yield(mut self, grams: f64) -> Self {
        self.yield_g = Some(grams);
        self
    }

    pub fn with_water_temp(mut self, celsius: f64) -> Self {
        self.water_temp_c = Some(celsius);
        self
    }

    pub fn with_pressure(mut self, bar: f64) -> Self {
        self.pressure_bar = Some(bar);
        self
    }

    pub fn with_ratio(mut self, ratio: BrewRatio) -> Self {
        self.ratio = Some(ratio);
        self
    }

    pub fn with_extraction_time(mut self, secs: f64) -> Self {
        self.extraction_time_s = Some(secs);
        self
    }

    /// The stated beverage, or the one implied by the stated machine.
    pub fn effective_beverage(&self) -> Option<Beverage> {
        self.beverage
            .or_else(|| self.machine.map(|m| m.implied_beverage()))
    }

    /// Returns true if the slot has a value.
    ///
    /// The beverage slot counts as filled when a machine implies it.
    pub fn has(&self, slot: Slot) -> bool {
        match slot {
            Slot::Beverage => self.effective_beverage().is_some(),
            Slot::Machine => self.machine.is_some(),
            Slot::Roast => self.roast.is_some(),
            Slot::DoseG => self.dose_g.is_some(),
            Slot::WaterTempC => self.water_temp_c.is_some(),
            Slot::PressureBar => self.pressure_bar.is_some(),
        }
    }

    /// Clears a slot. Used when building test fixtures.
    pub fn without(mut self, slot: Slot) -> Self {
        match slot {
            Slot::Beverage => {
                self.beverage = None;
                self.machine = None;
            }
            Slot::Machine => self.machine = None,
            Slot::Roast => self.roast = None,
            Slot::DoseG => self.dose_g = None,
            Slot::WaterTempC => self.water_temp_c = None,
            Slot::PressureBar => self.pressure_bar = None,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_nothing() {
        let params = BrewingParameters::new();
        for slot in [
            Slot::Beverage,
            Slot::Machine,
            Slot::Roast,
            Slot::DoseG,
            Slot::WaterTempC,
            Slot::PressureBar,
        ] {
            assert!(!params.has(slot));
        }
    }

    #[test]
    fn machine_implies_beverage() {
        let params = BrewingParameters::new().with_machine(Machine::EspressoLever);
        assert_eq!(params.effective_beverage(), Some(Beverage::Espresso));
        assert!(params.has(Slot::Beverage));
    }

    #[test]
    fn stated_beverage_beats_machine() {
        let params = BrewingParameters::new()
            .with_machine(Machine::EspressoPump)
            .with_beverage(Beverage::Latte);
        assert_eq!(params.effective_beverage(), Some(Beverage::Latte));
    }

    #[test]
    fn ratio_multiplier_rejects_zero() {
        assert_eq!(BrewRatio::new(1.0, 2.5).multiplier(), Some(2.5));
        assert_eq!(BrewRatio::new(0.0, 2.5).multiplier(), None);
    }

    #[test]
    fn deserializes_partial_json() {
        let params: BrewingParameters =
            serde_json::from_str(r#"{"beverage":"pourover","dose_g":20}"#).unwrap();
        assert_eq!(params.beverage, Some(Beverage::Pourover));
        assert_eq!(params.dose_g, Some(20.0));
        assert!(params.roast.is_none());
    }

    #[test]
    fn slot_serializes_to_field_name() {
        let json = serde_json::to_string(&Slot::WaterTempC).unwrap();
        assert_eq!(json, "\"water_temp_c\"");
    }
}
