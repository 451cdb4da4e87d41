//! Brewing domain - Vocabulary, parameters and the deterministic rule engine.

mod parameters;
mod query;
mod recipe;
mod rules;
mod vocabulary;

pub use parameters::{BrewRatio, BrewingParameters, Slot};
pub use query::RetrievalQuery;
pub use recipe::{Recipe, RecipeStep};
pub use rules::{
    BrewMethod, BrewProfile, EspressoMachine, MachineRow, MethodRow, RoastRow, RuleEngine,
    ESPRESSO_MACHINE_TABLE, METHOD_TABLE, PRESSURE_BOUNDS_BAR, ROAST_TABLE, TEMP_BOUNDS_C,
};
pub use vocabulary::{Beverage, Machine, Roast};
