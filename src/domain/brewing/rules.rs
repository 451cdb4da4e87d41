//! Rule engine: deterministic recipe lookup over brewing heuristics.
//!
//! Parameters are first resolved into a [`BrewProfile`], a tagged variant
//! over method, machine and roast. Every number in a recipe then comes from
//! one of three lookup tables indexed by that profile, so the full rule set
//! can be read (and tested) row by row:
//!
//! - [`ROAST_TABLE`]: ratio and temperature window per method and roast
//! - [`METHOD_TABLE`]: dose, ratio bounds, time and bloom per method
//! - [`ESPRESSO_MACHINE_TABLE`]: pressure and shot time per espresso machine
//!
//! Out-of-range inputs are clamped to the nearest valid bound and the clamp
//! is recorded as a `clamp:<field>` rationale tag. The engine never fails.

use std::collections::BTreeSet;

use super::parameters::BrewingParameters;
use super::recipe::{Recipe, RecipeStep};
use super::vocabulary::{Beverage, Machine, Roast};
use crate::domain::foundation::{round1, Range};

/// Valid water temperature for any method (°C).
pub const TEMP_BOUNDS_C: (f64, f64) = (80.0, 100.0);

/// Valid user-supplied espresso pressure (bar).
pub const PRESSURE_BOUNDS_BAR: (f64, f64) = (6.0, 10.0);

/// Pressure below which a pump machine is considered under-performing.
const LOW_PUMP_PRESSURE_BAR: f64 = 8.0;

/// Brewing method, the primary key of every rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrewMethod {
    Espresso = 0,
    Pourover = 1,
    Aeropress = 2,
    FrenchPress = 3,
    Moka = 4,
}

impl BrewMethod {
    pub fn for_beverage(beverage: Beverage) -> Self {
        match beverage {
            Beverage::Espresso | Beverage::Americano | Beverage::Cappuccino | Beverage::Latte => {
                BrewMethod::Espresso
            }
            Beverage::Pourover => BrewMethod::Pourover,
            Beverage::Aeropress => BrewMethod::Aeropress,
            Beverage::FrenchPress => BrewMethod::FrenchPress,
            Beverage::Moka => BrewMethod::Moka,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrewMethod::Espresso => "espresso",
            BrewMethod::Pourover => "pourover",
            BrewMethod::Aeropress => "aeropress",
            BrewMethod::FrenchPress => "french_press",
            BrewMethod::Moka => "moka",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Espresso machine kinds that carry their own pressure and time rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EspressoMachine {
    Pump = 0,
    Lever = 1,
    Pod = 2,
}

impl EspressoMachine {
    pub fn from_machine(machine: Machine) -> Option<Self> {
        match machine {
            Machine::EspressoPump => Some(EspressoMachine::Pump),
            Machine::EspressoLever => Some(EspressoMachine::Lever),
            Machine::Pod => Some(EspressoMachine::Pod),
            _ => None,
        }
    }

    pub fn machine(&self) -> Machine {
        match self {
            EspressoMachine::Pump => Machine::EspressoPump,
            EspressoMachine::Lever => Machine::EspressoLever,
            EspressoMachine::Pod => Machine::Pod,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

fn roast_index(roast: Roast) -> usize {
    match roast {
        Roast::Light => 0,
        Roast::Medium => 1,
        Roast::Dark => 2,
    }
}

/// The resolved combination that selects table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrewProfile {
    Espresso {
        drink: Beverage,
        machine: EspressoMachine,
        roast: Roast,
    },
    Pourover {
        roast: Roast,
    },
    Aeropress {
        roast: Roast,
    },
    FrenchPress {
        roast: Roast,
    },
    Moka {
        roast: Roast,
    },
}

impl BrewProfile {
    /// Resolves the profile, filling unset or inapplicable fields with
    /// defaults and recording each substitution in `tags`.
    pub fn resolve(params: &BrewingParameters, tags: &mut BTreeSet<String>) -> Self {
        let beverage = params.effective_beverage().unwrap_or_else(|| {
            tags.insert("default:beverage".to_string());
            Beverage::Espresso
        });
        let roast = params.roast.unwrap_or_else(|| {
            tags.insert("default:roast".to_string());
            Roast::Medium
        });

        if let Some(machine) = params.machine {
            if !beverage.accepts_machine(machine) {
                tags.insert("ignored:machine".to_string());
            }
        }

        match BrewMethod::for_beverage(beverage) {
            BrewMethod::Espresso => {
                let machine = params
                    .machine
                    .and_then(EspressoMachine::from_machine)
                    .unwrap_or_else(|| {
                        tags.insert("default:machine".to_string());
                        EspressoMachine::Pump
                    });
                BrewProfile::Espresso {
                    drink: beverage,
                    machine,
                    roast,
                }
            }
            BrewMethod::Pourover => BrewProfile::Pourover { roast },
            BrewMethod::Aeropress => BrewProfile::Aeropress { roast },
            BrewMethod::FrenchPress => BrewProfile::FrenchPress { roast },
            BrewMethod::Moka => BrewProfile::Moka { roast },
        }
    }

    pub fn method(&self) -> BrewMethod {
        match self {
            BrewProfile::Espresso { .. } => BrewMethod::Espresso,
            BrewProfile::Pourover { .. } => BrewMethod::Pourover,
            BrewProfile::Aeropress { .. } => BrewMethod::Aeropress,
            BrewProfile::FrenchPress { .. } => BrewMethod::FrenchPress,
            BrewProfile::Moka { .. } => BrewMethod::Moka,
        }
    }

    pub fn roast(&self) -> Roast {
        match *self {
            BrewProfile::Espresso { roast, .. }
            | BrewProfile::Pourover { roast }
            | BrewProfile::Aeropress { roast }
            | BrewProfile::FrenchPress { roast }
            | BrewProfile::Moka { roast } => roast,
        }
    }

    pub fn beverage(&self) -> Beverage {
        match self {
            BrewProfile::Espresso { drink, .. } => *drink,
            BrewProfile::Pourover { .. } => Beverage::Pourover,
            BrewProfile::Aeropress { .. } => Beverage::Aeropress,
            BrewProfile::FrenchPress { .. } => Beverage::FrenchPress,
            BrewProfile::Moka { .. } => Beverage::Moka,
        }
    }

    pub fn machine(&self) -> Machine {
        match self {
            BrewProfile::Espresso { machine, .. } => machine.machine(),
            other => other.beverage().default_machine(),
        }
    }
}

/// Ratio and temperature window for one method and roast.
#[derive(Debug, Clone, Copy)]
pub struct RoastRow {
    pub ratio: (f64, f64),
    pub temp_c: (f64, f64),
}

/// Per-method quantities independent of roast.
#[derive(Debug, Clone, Copy)]
pub struct MethodRow {
    pub default_dose_g: f64,
    pub dose_bounds_g: (f64, f64),
    pub ratio_bounds: (f64, f64),
    pub time_s: (f64, f64),
    pub bloom_s: Option<(f64, f64)>,
    pub grind: &'static str,
}

/// Pressure and shot time for one espresso machine kind.
#[derive(Debug, Clone, Copy)]
pub struct MachineRow {
    pub pressure_bar: f64,
    pub pressure_window_bar: (f64, f64),
    pub time_s: (f64, f64),
}

const fn row(ratio: (f64, f64), temp_c: (f64, f64)) -> RoastRow {
    RoastRow { ratio, temp_c }
}

/// Indexed by `[BrewMethod][Roast]` (light, medium, dark).
///
/// Lighter roasts get the longer ratio and hotter window.
pub const ROAST_TABLE: [[RoastRow; 3]; 5] = [
    // espresso
    [
        row((2.2, 2.5), (94.0, 96.0)),
        row((2.1, 2.3), (92.0, 95.0)),
        row((2.0, 2.2), (90.0, 93.0)),
    ],
    // pourover
    [
        row((16.0, 17.0), (94.0, 96.0)),
        row((15.5, 16.5), (92.0, 95.0)),
        row((15.0, 16.0), (90.0, 94.0)),
    ],
    // aeropress
    [
        row((14.5, 16.0), (92.0, 96.0)),
        row((14.0, 15.5), (88.0, 92.0)),
        row((13.0, 15.0), (82.0, 88.0)),
    ],
    // french press
    [
        row((16.0, 17.0), (94.0, 96.0)),
        row((15.5, 16.5), (92.0, 94.0)),
        row((15.0, 16.0), (90.0, 93.0)),
    ],
    // moka
    [
        row((8.0, 10.0), (90.0, 95.0)),
        row((7.5, 9.5), (88.0, 92.0)),
        row((7.0, 9.0), (85.0, 90.0)),
    ],
];

/// Indexed by `BrewMethod`.
pub const METHOD_TABLE: [MethodRow; 5] = [
    MethodRow {
        default_dose_g: 18.0,
        dose_bounds_g: (7.0, 25.0),
        ratio_bounds: (1.0, 4.0),
        time_s: (25.0, 32.0),
        bloom_s: None,
        grind: "fine",
    },
    MethodRow {
        default_dose_g: 20.0,
        dose_bounds_g: (8.0, 60.0),
        ratio_bounds: (12.0, 20.0),
        time_s: (150.0, 210.0),
        bloom_s: Some((30.0, 45.0)),
        grind: "medium; sour or weak → finer, bitter or astringent → coarser",
    },
    MethodRow {
        default_dose_g: 15.0,
        dose_bounds_g: (8.0, 35.0),
        ratio_bounds: (6.0, 18.0),
        time_s: (90.0, 150.0),
        bloom_s: None,
        grind: "medium-fine; bitter → coarser, sour → finer",
    },
    MethodRow {
        default_dose_g: 30.0,
        dose_bounds_g: (10.0, 80.0),
        ratio_bounds: (10.0, 20.0),
        time_s: (240.0, 300.0),
        bloom_s: None,
        grind: "coarse; silty cup → coarser",
    },
    MethodRow {
        default_dose_g: 15.0,
        dose_bounds_g: (7.0, 30.0),
        ratio_bounds: (5.0, 12.0),
        time_s: (180.0, 300.0),
        bloom_s: None,
        grind: "medium-fine, level the basket without tamping",
    },
];

/// Indexed by `EspressoMachine` (pump, lever, pod).
///
/// Lever machines get a wider time window than pump machines.
pub const ESPRESSO_MACHINE_TABLE: [MachineRow; 3] = [
    MachineRow {
        pressure_bar: 9.0,
        pressure_window_bar: (8.0, 10.0),
        time_s: (25.0, 32.0),
    },
    MachineRow {
        pressure_bar: 7.0,
        pressure_window_bar: (6.0, 8.0),
        time_s: (25.0, 40.0),
    },
    MachineRow {
        pressure_bar: 9.0,
        pressure_window_bar: (8.0, 10.0),
        time_s: (20.0, 30.0),
    },
];

/// Maps complete brewing parameters to a deterministic [`Recipe`].
///
/// Stateless. Two calls with equal parameters return equal recipes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Builds the recipe for `params`.
    ///
    /// Intended for parameters the slot machine reports as ready. Missing
    /// fields are still tolerated and filled from defaults, each tagged
    /// `default:<slot>`.
    pub fn recommend(&self, params: &BrewingParameters) -> Recipe {
        let mut tags = BTreeSet::new();
        let mut adjustments = Vec::new();

        let profile = BrewProfile::resolve(params, &mut tags);
        let method = profile.method();
        let roast = profile.roast();
        let beverage = profile.beverage();
        let roast_row = ROAST_TABLE[method.index()][roast_index(roast)];
        let method_row = METHOD_TABLE[method.index()];

        tags.insert(format!("method:{}", method.as_str()));
        tags.insert(format!("roast:{}", roast));
        tags.insert(format!("machine:{}", profile.machine()));
        if beverage.is_milk_or_water_drink() {
            tags.insert("base:espresso".to_string());
        }

        // Dose
        let dose_g = match params.dose_g {
            Some(dose) => round1(clamp_tagged(
                dose,
                Range::new(method_row.dose_bounds_g.0, method_row.dose_bounds_g.1),
                "dose_g",
                &mut tags,
            )),
            None => {
                tags.insert("default:dose_g".to_string());
                method_row.default_dose_g
            }
        };

        // Ratio: stated, then derived from yield, then table
        let ratio_bounds = Range::new(method_row.ratio_bounds.0, method_row.ratio_bounds.1);
        let stated = params.ratio.and_then(|r| r.multiplier());
        let from_yield = params
            .yield_g
            .filter(|y| y.is_finite() && *y > 0.0)
            .map(|y| y / dose_g);
        let ratio = if let Some(multiplier) = stated {
            tags.insert("ratio:stated".to_string());
            Range::point(round1(clamp_tagged(
                multiplier,
                ratio_bounds,
                "ratio",
                &mut tags,
            )))
        } else if let Some(multiplier) = from_yield {
            tags.insert("ratio:from_yield".to_string());
            Range::point(round1(clamp_tagged(
                multiplier,
                ratio_bounds,
                "ratio",
                &mut tags,
            )))
        } else {
            Range::new(roast_row.ratio.0, roast_row.ratio.1)
        };
        let yield_g = ratio.scale(dose_g).rounded();

        // Temperature
        let temperature_c = Range::new(roast_row.temp_c.0, roast_row.temp_c.1);
        let target_temp_c = match params.water_temp_c {
            Some(temp) => round1(clamp_tagged(
                temp,
                Range::new(TEMP_BOUNDS_C.0, TEMP_BOUNDS_C.1),
                "water_temp_c",
                &mut tags,
            )),
            None => {
                tags.insert("default:water_temp_c".to_string());
                temperature_c.midpoint()
            }
        };
        if target_temp_c < temperature_c.min() {
            tags.insert("adjust:temp_up".to_string());
            adjustments.push(format!(
                "Raise water temperature toward {} °C for a {} roast.",
                temperature_c, roast
            ));
        } else if target_temp_c > temperature_c.max() {
            tags.insert("adjust:temp_down".to_string());
            adjustments.push(format!(
                "Lower water temperature toward {} °C for a {} roast.",
                temperature_c, roast
            ));
        }

        // Time, pressure and bloom
        let (time_s, pressure_bar, guidance) = match profile {
            BrewProfile::Espresso { machine, .. } => {
                let machine_row = ESPRESSO_MACHINE_TABLE[machine.index()];
                if machine == EspressoMachine::Lever {
                    tags.insert("time:lever_widened".to_string());
                }
                let pressure = match params.pressure_bar {
                    Some(bar) => {
                        if bar > PRESSURE_BOUNDS_BAR.1 {
                            adjustments.push(format!(
                                "Pressure above {} bar tends to channel; aim for ~{} bar.",
                                PRESSURE_BOUNDS_BAR.1, machine_row.pressure_bar
                            ));
                        }
                        let bar = round1(clamp_tagged(
                            bar,
                            Range::new(PRESSURE_BOUNDS_BAR.0, PRESSURE_BOUNDS_BAR.1),
                            "pressure_bar",
                            &mut tags,
                        ));
                        if machine == EspressoMachine::Pump && bar < LOW_PUMP_PRESSURE_BAR {
                            adjustments.push(
                                "Low pump pressure: grind a touch finer or raise the dose."
                                    .to_string(),
                            );
                        }
                        bar
                    }
                    None => {
                        tags.insert("default:pressure_bar".to_string());
                        machine_row.pressure_bar
                    }
                };
                let window = Range::new(
                    machine_row.pressure_window_bar.0,
                    machine_row.pressure_window_bar.1,
                );
                let guidance = format!(
                    "{}; aim for ~{} bar ({} bar typical on a {})",
                    method_row.grind,
                    pressure,
                    window,
                    machine.machine().display_name()
                );
                (
                    Range::new(machine_row.time_s.0, machine_row.time_s.1),
                    Some(pressure),
                    guidance,
                )
            }
            _ => {
                if params.pressure_bar.is_some() {
                    tags.insert("ignored:pressure_bar".to_string());
                }
                (
                    Range::new(method_row.time_s.0, method_row.time_s.1),
                    None,
                    method_row.grind.to_string(),
                )
            }
        };
        let bloom_s = method_row.bloom_s.map(|(lo, hi)| Range::new(lo, hi));

        // Observed brew time
        if let Some(observed) = params.extraction_time_s.filter(|t| t.is_finite()) {
            if observed < time_s.min() {
                tags.insert("adjust:grind_finer".to_string());
                adjustments.push(format!(
                    "Ran fast ({} s): grind finer to reach {} s.",
                    round1(observed),
                    time_s
                ));
            } else if observed > time_s.max() {
                tags.insert("adjust:grind_coarser".to_string());
                adjustments.push(format!(
                    "Ran slow ({} s): grind coarser to reach {} s.",
                    round1(observed),
                    time_s
                ));
            }
        }

        let steps = steps_for(
            &profile,
            dose_g,
            yield_g,
            target_temp_c,
            time_s,
            bloom_s,
            pressure_bar,
        );
        let notes = notes_for(&profile);

        Recipe {
            beverage,
            machine: profile.machine(),
            roast,
            dose_g,
            ratio,
            yield_g,
            temperature_c,
            target_temp_c,
            time_s,
            pressure_bar,
            bloom_s,
            guidance,
            steps,
            adjustments,
            notes,
            rationale_tags: tags,
        }
    }
}

/// Clamps `value` into `bounds`, tagging `clamp:<field>` when it moved.
fn clamp_tagged(value: f64, bounds: Range, field: &str, tags: &mut BTreeSet<String>) -> f64 {
    let clamped = bounds.clamp(value);
    if clamped != value {
        tags.insert(format!("clamp:{}", field));
    }
    clamped
}

fn steps_for(
    profile: &BrewProfile,
    dose_g: f64,
    yield_g: Range,
    temp_c: f64,
    time_s: Range,
    bloom_s: Option<Range>,
    pressure_bar: Option<f64>,
) -> Vec<RecipeStep> {
    let pressure = pressure_bar.unwrap_or_default();
    match profile {
        BrewProfile::Espresso { drink, machine, .. } => {
            let mut steps = match machine {
                EspressoMachine::Pod => vec![RecipeStep::new(
                    "Prepare",
                    format!("Heat the machine with the water at ~{} °C and insert the pod.", temp_c),
                )],
                _ => vec![RecipeStep::new(
                    "Prepare",
                    format!(
                        "Preheat group and portafilter at ~{} °C; dose {} g and tamp level.",
                        temp_c, dose_g
                    ),
                )],
            };
            steps.push(match machine {
                EspressoMachine::Lever => RecipeStep::new(
                    "Pre-infuse",
                    "Raise the lever and let the puck soak for 5–8 s before pulling.",
                ),
                _ => RecipeStep::new("Pre-infuse", "Pre-infuse at low pressure for ~5 s if available."),
            });
            steps.push(RecipeStep::new(
                "Extract",
                format!(
                    "Pull {} g in {} s at ~{} bar.",
                    yield_g, time_s, pressure
                ),
            ));
            match drink {
                Beverage::Americano => steps.push(RecipeStep::new(
                    "Finish",
                    "Top with 2–3× the shot weight of hot water.",
                )),
                Beverage::Cappuccino => steps.push(RecipeStep::new(
                    "Finish",
                    "Steam 120–150 g of milk to 60–65 °C with thick foam and pour.",
                )),
                Beverage::Latte => steps.push(RecipeStep::new(
                    "Finish",
                    "Steam 200–250 g of milk to 60–65 °C with light foam and pour.",
                )),
                _ => {}
            }
            steps
        }
        BrewProfile::Pourover { .. } => {
            let bloom = bloom_s.unwrap_or_else(|| Range::new(30.0, 45.0));
            vec![
                RecipeStep::new("Rinse", "Rinse the paper filter with hot water and discard it."),
                RecipeStep::new(
                    "Bloom",
                    format!(
                        "Add {} g of coffee, pour {} g of water at {} °C and wait {} s.",
                        dose_g,
                        round1(dose_g * 2.0),
                        temp_c,
                        bloom
                    ),
                ),
                RecipeStep::new(
                    "Pour",
                    format!("Pour in slow spirals up to {} g total.", yield_g),
                ),
                RecipeStep::new(
                    "Drawdown",
                    format!("Let it drain; aim to finish in {} s.", time_s),
                ),
            ]
        }
        BrewProfile::Aeropress { .. } => vec![
            RecipeStep::new(
                "Fill",
                format!(
                    "Add {} g of coffee and {} g of water at {} °C.",
                    dose_g, yield_g, temp_c
                ),
            ),
            RecipeStep::new("Steep", "Stir briefly, cap and steep for about 90 s."),
            RecipeStep::new(
                "Press",
                format!("Press gently for 20–30 s; total {} s.", time_s),
            ),
        ],
        BrewProfile::FrenchPress { .. } => vec![
            RecipeStep::new(
                "Add",
                format!(
                    "Add {} g of coarse coffee and {} g of water at {} °C.",
                    dose_g, yield_g, temp_c
                ),
            ),
            RecipeStep::new("Steep", format!("Steep for {} s.", time_s)),
            RecipeStep::new("Skim", "Break the crust and skim off the foam."),
            RecipeStep::new("Press", "Press slowly and decant right away."),
        ],
        BrewProfile::Moka { .. } => vec![
            RecipeStep::new(
                "Fill",
                format!(
                    "Fill the boiler with water at ~{} °C up to the valve.",
                    temp_c
                ),
            ),
            RecipeStep::new(
                "Dose",
                format!("Fill the basket with {} g and level it without tamping.", dose_g),
            ),
            RecipeStep::new(
                "Brew",
                format!(
                    "Heat on medium-low; stop when it starts to sputter, around {} s, for ~{} g.",
                    time_s, yield_g
                ),
            ),
        ],
    }
}

fn notes_for(profile: &BrewProfile) -> Vec<String> {
    let mut notes = Vec::new();
    match profile {
        BrewProfile::Espresso { drink, machine, .. } => {
            if drink.is_milk_or_water_drink() {
                notes.push(format!("Espresso base: dial in the shot first, then build the {}.", drink.display_name()));
            }
            match machine {
                EspressoMachine::Lever => notes.push(
                    "Lever pressure declines through the shot; expect a longer, gentler extraction."
                        .to_string(),
                ),
                EspressoMachine::Pod => notes.push(
                    "Pods fix dose and grind; adjust with shot volume instead.".to_string(),
                ),
                EspressoMachine::Pump => {}
            }
        }
        BrewProfile::Pourover { .. } => {
            notes.push("Keep the bed flat at the end of the drawdown for even extraction.".to_string())
        }
        BrewProfile::Aeropress { .. } => {
            notes.push("Dilute to taste if the cup is too strong.".to_string())
        }
        BrewProfile::FrenchPress { .. } => {
            notes.push("Do not leave coffee sitting on the grounds after pressing.".to_string())
        }
        BrewProfile::Moka { .. } => {
            notes.push("Cool the base under running water to stop extraction.".to_string())
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::brewing::BrewRatio;

    fn engine() -> RuleEngine {
        RuleEngine::new()
    }

    fn lever_light() -> BrewingParameters {
        BrewingParameters::new()
            .with_beverage(Beverage::Espresso)
            .with_machine(Machine::EspressoLever)
            .with_roast(Roast::Light)
            .with_dose(18.0)
            .with_water_temp(95.0)
            .with_pressure(7.0)
    }

    mod tables {
        use super::*;

        #[test]
        fn every_row_is_well_formed() {
            for method in ROAST_TABLE.iter() {
                for row in method.iter() {
                    assert!(row.ratio.0 <= row.ratio.1);
                    assert!(row.temp_c.0 <= row.temp_c.1);
                    assert!(row.temp_c.0 >= TEMP_BOUNDS_C.0 && row.temp_c.1 <= TEMP_BOUNDS_C.1);
                }
            }
            for row in METHOD_TABLE.iter() {
                assert!(row.dose_bounds_g.0 <= row.default_dose_g);
                assert!(row.default_dose_g <= row.dose_bounds_g.1);
                assert!(row.time_s.0 <= row.time_s.1);
            }
        }

        #[test]
        fn lighter_roast_gets_longer_ratio_and_hotter_window() {
            for method in ROAST_TABLE.iter() {
                let (light, dark) = (method[0], method[2]);
                assert!(light.ratio.1 >= dark.ratio.1);
                assert!(light.temp_c.1 >= dark.temp_c.1);
            }
        }

        #[test]
        fn espresso_ratio_stays_within_documented_band() {
            for row in ROAST_TABLE[BrewMethod::Espresso.index()].iter() {
                assert!(row.ratio.0 >= 2.0 && row.ratio.1 <= 2.5);
            }
        }

        #[test]
        fn lever_window_is_wider_than_pump() {
            let pump = ESPRESSO_MACHINE_TABLE[EspressoMachine::Pump.index()];
            let lever = ESPRESSO_MACHINE_TABLE[EspressoMachine::Lever.index()];
            assert!(lever.time_s.1 - lever.time_s.0 > pump.time_s.1 - pump.time_s.0);
        }

        #[test]
        fn pourover_ratio_within_fifteen_to_seventeen() {
            for row in ROAST_TABLE[BrewMethod::Pourover.index()].iter() {
                assert!(row.ratio.0 >= 15.0 && row.ratio.1 <= 17.0);
            }
        }
    }

    mod espresso {
        use super::*;

        #[test]
        fn lever_light_roast_scenario() {
            let recipe = engine().recommend(&lever_light());

            assert_eq!(recipe.ratio, Range::new(2.2, 2.5));
            assert!(recipe.temperature_c.contains(95.0));
            assert_eq!(recipe.target_temp_c, 95.0);
            assert_eq!(recipe.pressure_bar, Some(7.0));
            assert!(recipe.time_s.max() >= 40.0);
            assert!(recipe.has_tag("time:lever_widened"));
            assert!(recipe.rationale_tags.iter().all(|t| !t.starts_with("clamp:")));
            assert!(recipe.rationale_tags.iter().all(|t| !t.starts_with("default:")));
        }

        #[test]
        fn yield_follows_ratio_and_dose() {
            let recipe = engine().recommend(&lever_light());
            assert_eq!(recipe.yield_g, Range::new(39.6, 45.0));
        }

        #[test]
        fn overheated_water_is_clamped_and_tagged() {
            let params = lever_light().with_water_temp(150.0);
            let recipe = engine().recommend(&params);

            assert_eq!(recipe.target_temp_c, TEMP_BOUNDS_C.1);
            assert!(recipe.temperature_c.max() <= TEMP_BOUNDS_C.1);
            assert!(recipe.has_tag("clamp:water_temp_c"));
            assert!(recipe.has_tag("adjust:temp_down"));
        }

        #[test]
        fn excessive_pressure_is_clamped_with_warning() {
            let params = lever_light()
                .with_machine(Machine::EspressoPump)
                .with_pressure(15.0);
            let recipe = engine().recommend(&params);

            assert_eq!(recipe.pressure_bar, Some(PRESSURE_BOUNDS_BAR.1));
            assert!(recipe.has_tag("clamp:pressure_bar"));
            assert!(recipe.adjustments.iter().any(|a| a.contains("channel")));
        }

        #[test]
        fn low_pump_pressure_adds_adjustment() {
            let params = lever_light()
                .with_machine(Machine::EspressoPump)
                .with_pressure(6.5);
            let recipe = engine().recommend(&params);
            assert!(recipe.adjustments.iter().any(|a| a.contains("Low pump pressure")));
        }

        #[test]
        fn pressure_defaults_by_machine() {
            let lever = engine().recommend(&lever_light().without(crate::domain::brewing::Slot::PressureBar));
            assert_eq!(lever.pressure_bar, Some(7.0));
            assert!(lever.has_tag("default:pressure_bar"));

            let pump = engine().recommend(
                &lever_light()
                    .with_machine(Machine::EspressoPump)
                    .without(crate::domain::brewing::Slot::PressureBar),
            );
            assert_eq!(pump.pressure_bar, Some(9.0));
        }

        #[test]
        fn darker_roast_shortens_ratio_and_cools_window() {
            let light = engine().recommend(&lever_light());
            let dark = engine().recommend(&lever_light().with_roast(Roast::Dark));
            assert!(dark.ratio.max() < light.ratio.max());
            assert!(dark.temperature_c.max() < light.temperature_c.max());
        }

        #[test]
        fn stated_ratio_wins_over_yield() {
            let params = lever_light()
                .with_ratio(BrewRatio::new(1.0, 2.0))
                .with_yield(50.0);
            let recipe = engine().recommend(&params);
            assert_eq!(recipe.ratio, Range::point(2.0));
            assert_eq!(recipe.yield_g, Range::point(36.0));
            assert!(recipe.has_tag("ratio:stated"));
        }

        #[test]
        fn yield_derives_ratio() {
            let recipe = engine().recommend(&lever_light().with_yield(40.0));
            assert_eq!(recipe.ratio, Range::point(2.2));
            assert!(recipe.has_tag("ratio:from_yield"));
        }

        #[test]
        fn fast_shot_suggests_finer_grind() {
            let params = lever_light()
                .with_machine(Machine::EspressoPump)
                .with_extraction_time(18.0);
            let recipe = engine().recommend(&params);
            assert!(recipe.has_tag("adjust:grind_finer"));
        }

        #[test]
        fn slow_shot_suggests_coarser_grind() {
            let params = lever_light()
                .with_machine(Machine::EspressoPump)
                .with_extraction_time(45.0);
            let recipe = engine().recommend(&params);
            assert!(recipe.has_tag("adjust:grind_coarser"));
        }

        #[test]
        fn latte_uses_espresso_base() {
            let params = lever_light().with_beverage(Beverage::Latte);
            let recipe = engine().recommend(&params);
            assert_eq!(recipe.beverage, Beverage::Latte);
            assert!(recipe.has_tag("base:espresso"));
            assert!(recipe.has_tag("method:espresso"));
            assert!(recipe.notes.iter().any(|n| n.starts_with("Espresso base")));
        }

        #[test]
        fn non_espresso_machine_falls_back_to_pump() {
            let params = lever_light().with_machine(Machine::FrenchPress);
            let recipe = engine().recommend(&params);
            assert_eq!(recipe.machine, Machine::EspressoPump);
            assert!(recipe.has_tag("ignored:machine"));
        }
    }

    mod filter_methods {
        use super::*;

        #[test]
        fn pourover_has_bloom_and_no_pressure() {
            let params = BrewingParameters::new()
                .with_beverage(Beverage::Pourover)
                .with_roast(Roast::Medium)
                .with_dose(20.0)
                .with_pressure(9.0);
            let recipe = engine().recommend(&params);

            assert_eq!(recipe.pressure_bar, None);
            assert_eq!(recipe.bloom_s, Some(Range::new(30.0, 45.0)));
            assert_eq!(recipe.ratio, Range::new(15.5, 16.5));
            assert_eq!(recipe.yield_g, Range::new(310.0, 330.0));
            assert!(recipe.has_tag("ignored:pressure_bar"));
            assert!(recipe.has_tag("default:water_temp_c"));
            assert_eq!(recipe.machine, Machine::PouroverKettle);
        }

        #[test]
        fn french_press_default_dose() {
            let params = BrewingParameters::new()
                .with_beverage(Beverage::FrenchPress)
                .with_roast(Roast::Dark);
            let recipe = engine().recommend(&params);
            assert_eq!(recipe.dose_g, 30.0);
            assert!(recipe.has_tag("default:dose_g"));
        }

        #[test]
        fn dose_is_clamped_per_method() {
            let params = BrewingParameters::new()
                .with_beverage(Beverage::Moka)
                .with_dose(500.0);
            let recipe = engine().recommend(&params);
            assert_eq!(recipe.dose_g, METHOD_TABLE[BrewMethod::Moka.index()].dose_bounds_g.1);
            assert!(recipe.has_tag("clamp:dose_g"));
        }
    }

    mod defaults {
        use super::*;

        #[test]
        fn empty_parameters_produce_tagged_espresso() {
            let recipe = engine().recommend(&BrewingParameters::new());
            assert_eq!(recipe.beverage, Beverage::Espresso);
            assert_eq!(recipe.roast, Roast::Medium);
            assert_eq!(recipe.machine, Machine::EspressoPump);
            for tag in [
                "default:beverage",
                "default:roast",
                "default:machine",
                "default:dose_g",
                "default:water_temp_c",
                "default:pressure_bar",
            ] {
                assert!(recipe.has_tag(tag), "missing {}", tag);
            }
        }

        #[test]
        fn machine_alone_implies_method() {
            let params = BrewingParameters::new().with_machine(Machine::Aeropress);
            let recipe = engine().recommend(&params);
            assert_eq!(recipe.beverage, Beverage::Aeropress);
            assert!(!recipe.has_tag("default:beverage"));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn any_beverage() -> impl Strategy<Value = Beverage> {
            prop::sample::select(Beverage::ALL.to_vec())
        }

        fn any_roast() -> impl Strategy<Value = Roast> {
            prop::sample::select(vec![Roast::Light, Roast::Medium, Roast::Dark])
        }

        fn any_machine() -> impl Strategy<Value = Machine> {
            prop::sample::select(vec![
                Machine::EspressoPump,
                Machine::EspressoLever,
                Machine::Pod,
                Machine::Moka,
                Machine::PouroverKettle,
                Machine::Aeropress,
                Machine::FrenchPress,
            ])
        }

        fn any_params() -> impl Strategy<Value = BrewingParameters> {
            (
                prop::option::of(any_beverage()),
                prop::option::of(any_machine()),
                prop::option::of(any_roast()),
                prop::option::of(-50.0f64..500.0),
                prop::option::of(0.0f64..200.0),
                prop::option::of(-5.0f64..30.0),
                prop::option::of(1.0f64..1000.0),
            )
                .prop_map(|(beverage, machine, roast, dose, temp, pressure, yld)| {
                    BrewingParameters {
                        beverage,
                        machine,
                        roast,
                        dose_g: dose,
                        water_temp_c: temp,
                        pressure_bar: pressure,
                        yield_g: yld,
                        ..Default::default()
                    }
                })
        }

        proptest! {
            #[test]
            fn recommend_is_deterministic(params in any_params()) {
                let a = engine().recommend(&params);
                let b = engine().recommend(&params.clone());
                prop_assert_eq!(a, b);
            }

            #[test]
            fn ranges_are_well_formed_and_bounded(params in any_params()) {
                let recipe = engine().recommend(&params);
                prop_assert!(recipe.ratio.min() <= recipe.ratio.max());
                prop_assert!(recipe.yield_g.min() <= recipe.yield_g.max());
                prop_assert!(recipe.time_s.min() <= recipe.time_s.max());
                prop_assert!(recipe.target_temp_c >= TEMP_BOUNDS_C.0);
                prop_assert!(recipe.target_temp_c <= TEMP_BOUNDS_C.1);
                prop_assert!(recipe.dose_g > 0.0);
                if let Some(bar) = recipe.pressure_bar {
                    prop_assert!(bar >= PRESSURE_BOUNDS_BAR.0 && bar <= PRESSURE_BOUNDS_BAR.1);
                }
            }

            #[test]
            fn pressure_only_for_espresso_family(params in any_params()) {
                let recipe = engine().recommend(&params);
                prop_assert_eq!(recipe.pressure_bar.is_some(), recipe.beverage.is_espresso_based());
            }
        }
    }
}
