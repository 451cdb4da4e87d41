//! Retrieval query derivation.

use serde::Serialize;
use std::fmt;

use super::parameters::BrewingParameters;
use super::rules::BrewMethod;

const FALLBACK_QUERY: &str = "espresso recipe ratio temperature pressure";

/// A similarity-search query derived from brewing parameters.
///
/// Built only from beverage, roast and machine terms, so equal parameter
/// records always issue equal queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RetrievalQuery(String);

impl RetrievalQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn from_parameters(params: &BrewingParameters) -> Self {
        let mut parts: Vec<String> = Vec::new();
        let beverage = params.effective_beverage();

        if let Some(beverage) = beverage {
            parts.push(beverage.display_name().to_string());
        }
        if let Some(roast) = params.roast {
            parts.push(format!("{} roast", roast));
        }
        if let Some(machine) = params.machine {
            if beverage.map_or(true, |b| b.accepts_machine(machine)) {
                parts.push(machine.display_name().to_string());
            }
        }

        let topic = match beverage.map(BrewMethod::for_beverage) {
            Some(BrewMethod::Espresso) => Some("brew pressure temperature ratio"),
            Some(BrewMethod::Pourover) => Some("ratio temperature bloom time"),
            Some(_) => Some("recipe ratio temperature time"),
            None => None,
        };

        if parts.is_empty() {
            return Self::new(FALLBACK_QUERY);
        }
        if let Some(topic) = topic {
            parts.push(topic.to_string());
        }
        Self(parts.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RetrievalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
