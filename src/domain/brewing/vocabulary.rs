//! Enumerated brewing vocabulary: beverages, machines and roast levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The drink the user is making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Beverage {
    Espresso,
    Americano,
    Cappuccino,
    Latte,
    Pourover,
    Aeropress,
    FrenchPress,
    Moka,
}

impl Beverage {
    pub const ALL: [Beverage; 8] = [
        Beverage::Espresso,
        Beverage::Americano,
        Beverage::Cappuccino,
        Beverage::Latte,
        Beverage::Pourover,
        Beverage::Aeropress,
        Beverage::FrenchPress,
        Beverage::Moka,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Beverage::Espresso => "espresso",
            Beverage::Americano => "americano",
            Beverage::Cappuccino => "cappuccino",
            Beverage::Latte => "latte",
            Beverage::Pourover => "pourover",
            Beverage::Aeropress => "aeropress",
            Beverage::FrenchPress => "french_press",
            Beverage::Moka => "moka",
        }
    }

    /// Human-readable name used in rendered text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Beverage::FrenchPress => "french press",
            other => other.as_str(),
        }
    }

    /// Returns true for espresso and the drinks built on an espresso shot.
    pub fn is_espresso_based(&self) -> bool {
        matches!(
            self,
            Beverage::Espresso | Beverage::Americano | Beverage::Cappuccino | Beverage::Latte
        )
    }

    /// Returns true for drinks that add milk or water to an espresso base.
    pub fn is_milk_or_water_drink(&self) -> bool {
        self.is_espresso_based() && *self != Beverage::Espresso
    }

    /// The brewer assumed when the user never names one.
    pub fn default_machine(&self) -> Machine {
        match self {
            Beverage::Espresso | Beverage::Americano | Beverage::Cappuccino | Beverage::Latte => {
                Machine::EspressoPump
            }
            Beverage::Pourover => Machine::PouroverKettle,
            Beverage::Aeropress => Machine::Aeropress,
            Beverage::FrenchPress => Machine::FrenchPress,
            Beverage::Moka => Machine::Moka,
        }
    }

    /// Returns true if `machine` can brew this beverage.
    pub fn accepts_machine(&self, machine: Machine) -> bool {
        match self {
            b if b.is_espresso_based() => machine.is_espresso_machine(),
            other => other.default_machine() == machine,
        }
    }
}

impl fmt::Display for Beverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The brewing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    EspressoPump,
    EspressoLever,
    Pod,
    Moka,
    PouroverKettle,
    Aeropress,
    FrenchPress,
}

impl Machine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Machine::EspressoPump => "espresso_pump",
            Machine::EspressoLever => "espresso_lever",
            Machine::Pod => "pod",
            Machine::Moka => "moka",
            Machine::PouroverKettle => "pourover_kettle",
            Machine::Aeropress => "aeropress",
            Machine::FrenchPress => "french_press",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Machine::EspressoPump => "pump espresso machine",
            Machine::EspressoLever => "lever espresso machine",
            Machine::Pod => "pod machine",
            Machine::Moka => "moka pot",
            Machine::PouroverKettle => "pourover kettle",
            Machine::Aeropress => "aeropress",
            Machine::FrenchPress => "french press",
        }
    }

    pub fn is_espresso_machine(&self) -> bool {
        matches!(
            self,
            Machine::EspressoPump | Machine::EspressoLever | Machine::Pod
        )
    }

    /// Returns false for a kettle, which only heats water.
    pub fn is_brewing_device(&self) -> bool {
        !matches!(self, Machine::PouroverKettle)
    }

    /// The beverage a machine unambiguously implies when none was stated.
    pub fn implied_beverage(&self) -> Beverage {
        match self {
            Machine::EspressoPump | Machine::EspressoLever | Machine::Pod => Beverage::Espresso,
            Machine::Moka => Beverage::Moka,
            Machine::PouroverKettle => Beverage::Pourover,
            Machine::Aeropress => Beverage::Aeropress,
            Machine::FrenchPress => Beverage::FrenchPress,
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Roast level of the beans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Roast {
    Light,
    Medium,
    Dark,
}

impl Roast {
    pub fn as_str(&self) -> &'static str {
        match self {
            Roast::Light => "light",
            Roast::Medium => "medium",
            Roast::Dark => "dark",
        }
    }
}

impl fmt::Display for Roast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod beverage {
        use super::*;

        #[test]
        fn serializes_to_snake_case() {
            let json = serde_json::to_string(&Beverage::FrenchPress).unwrap();
            assert_eq!(json, "\"french_press\"");
        }

        #[test]
        fn espresso_family_is_recognised() {
            assert!(Beverage::Latte.is_espresso_based());
            assert!(Beverage::Latte.is_milk_or_water_drink());
            assert!(Beverage::Espresso.is_espresso_based());
            assert!(!Beverage::Espresso.is_milk_or_water_drink());
            assert!(!Beverage::Pourover.is_espresso_based());
        }

        #[test]
        fn every_default_machine_is_accepted() {
            for beverage in Beverage::ALL {
                assert!(beverage.accepts_machine(beverage.default_machine()));
            }
        }

        #[test]
        fn kettle_is_not_a_brewing_device() {
            assert!(!Machine::PouroverKettle.is_brewing_device());
            assert!(Machine::FrenchPress.is_brewing_device());
            assert!(Machine::EspressoLever.is_brewing_device());
        }

        #[test]
        fn pourover_rejects_espresso_machines() {
            assert!(!Beverage::Pourover.accepts_machine(Machine::EspressoLever));
            assert!(Beverage::Cappuccino.accepts_machine(Machine::EspressoLever));
        }
    }

    mod machine {
        use super::*;

        #[test]
        fn implied_beverage_round_trips_through_default_machine() {
            for beverage in [
                Beverage::Espresso,
                Beverage::Pourover,
                Beverage::Aeropress,
                Beverage::FrenchPress,
                Beverage::Moka,
            ] {
                assert_eq!(beverage.default_machine().implied_beverage(), beverage);
            }
        }

        #[test]
        fn deserializes_from_snake_case() {
            let m: Machine = serde_json::from_str("\"espresso_lever\"").unwrap();
            assert_eq!(m, Machine::EspressoLever);
        }
    }

    #[test]
    fn roast_displays_lowercase() {
        assert_eq!(Roast::Dark.to_string(), "dark");
    }
}
