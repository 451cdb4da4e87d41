//! Parameter extraction from free-form conversation turns.
//!
//! Only user turns are scanned, in chronological order. When a field is
//! mentioned more than once the most recent mention wins, both across turns
//! and within a single turn (a user correcting themselves mid-sentence).
//! Anything that cannot be parsed into a positive, finite value is skipped.
//! Extraction never fails.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range as Span;

use super::transcript::{Transcript, TurnRole};
use crate::domain::brewing::{Beverage, BrewRatio, BrewingParameters, Machine, Roast, Slot};
use crate::domain::foundation::round1;

/// Largest water multiplier accepted from a `1:N` mention.
const MAX_RATIO_MULTIPLIER: f64 = 20.0;

/// Unitless temperatures above this are read as Fahrenheit.
const FAHRENHEIT_THRESHOLD: f64 = 110.0;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction pattern must compile")
}

/// Filler allowed between a keyword and its number: "dose of ~18", "temp: 93".
const LINK: &str = r"\s*(?:of|is|at|:|=)?\s*(?:~|about|around|roughly)?\s*";

static DOSE_UNIT: Lazy<Regex> = Lazy::new(|| re(r"(\d+(?:\.\d+)?)\s*(?:g|grams?|gr)\b"));
static DOSE_CONTEXT: Lazy<Regex> =
    Lazy::new(|| re(&format!(r"\bdos(?:e|ing){}(\d+(?:\.\d+)?)\b", LINK)));

static YIELD_AFTER: Lazy<Regex> = Lazy::new(|| {
    re(&format!(
        r"\b(?:yield(?:ing)?|out(?:put)?|into|target(?:ing)?){}(\d+(?:\.\d+)?)\s*(?:g|grams?|ml)\b",
        LINK
    ))
});
static YIELD_CONTEXT: Lazy<Regex> =
    Lazy::new(|| re(&format!(r"\byield(?:ing)?{}(\d+(?:\.\d+)?)\b", LINK)));
static YIELD_BEFORE: Lazy<Regex> = Lazy::new(|| {
    re(r"(\d+(?:\.\d+)?)\s*(?:g|grams?|ml)\s+(?:of\s+)?(?:out|yield|water|beverage|liquid|espresso)\b")
});

static TEMP_UNIT: Lazy<Regex> = Lazy::new(|| {
    re(r"(\d+(?:\.\d+)?)\s*(?:(?:°|º|deg(?:rees?)?)\s*(celsius|fahrenheit|c|f)?|(celsius|fahrenheit|c|f)\b)")
});
static TEMP_CONTEXT: Lazy<Regex> =
    Lazy::new(|| re(&format!(r"\btemp(?:erature)?{}(\d+(?:\.\d+)?)\b", LINK)));

static PRESSURE_UNIT: Lazy<Regex> = Lazy::new(|| re(r"(\d+(?:\.\d+)?)\s*bars?\b"));
static PRESSURE_CONTEXT: Lazy<Regex> =
    Lazy::new(|| re(&format!(r"\bpressure{}(\d+(?:\.\d+)?)\b", LINK)));

static RATIO: Lazy<Regex> = Lazy::new(|| re(r"\b1\s*:\s*(\d+(?:\.\d+)?)\b"));

static TIME_SECONDS: Lazy<Regex> =
    Lazy::new(|| re(r"(\d+(?:\.\d+)?)\s*(?:s|secs?|seconds?)\b"));
static TIME_MINUTES: Lazy<Regex> =
    Lazy::new(|| re(r"(\d+(?:\.\d+)?)\s*(?:mins?|minutes?)\b"));

const ROAST_WORDS: &str =
    r"(medium[- ]light|medium[- ]dark|full[- ]city|light|medium|dark|blonde|city|vienna|french|italian)";

static ROAST_BEFORE: Lazy<Regex> =
    Lazy::new(|| re(&format!(r"\b{}[- ]?roast(?:ed)?\b", ROAST_WORDS)));
static ROAST_AFTER: Lazy<Regex> = Lazy::new(|| {
    re(&format!(
        r"\broast(?:\s+level)?\s*(?:is|:|=|-)?\s*{}\b",
        ROAST_WORDS
    ))
});
static ROAST_BARE: Lazy<Regex> =
    Lazy::new(|| re(r"\b(medium[- ]light|medium[- ]dark|light|medium|dark)\b"));

static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| re(r"\b(\d+(?:\.\d+)?)\b"));

/// A vocabulary phrase and what it sets.
struct Term {
    pattern: &'static str,
    beverage: Option<Beverage>,
    machine: Option<Machine>,
}

const fn term(
    pattern: &'static str,
    beverage: Option<Beverage>,
    machine: Option<Machine>,
) -> Term {
    Term {
        pattern,
        beverage,
        machine,
    }
}

/// Ordered longest phrase first; the first matching alternative wins.
const TERMS: &[Term] = &[
    term(
        r"stovetop espresso|moka(?: pot)?|stovetop",
        Some(Beverage::Moka),
        Some(Machine::Moka),
    ),
    term(
        r"espresso machine|espresso maker",
        None,
        Some(Machine::EspressoPump),
    ),
    term(
        r"lever(?: machine| espresso machine)?|la pavoni|flair",
        None,
        Some(Machine::EspressoLever),
    ),
    term(r"pump machine|pump", None, Some(Machine::EspressoPump)),
    term(
        r"nespresso|pod machine|pods?|capsules?",
        None,
        Some(Machine::Pod),
    ),
    term(
        r"aero ?press",
        Some(Beverage::Aeropress),
        Some(Machine::Aeropress),
    ),
    term(
        r"french press|cafeti[eè]re|plunger",
        Some(Beverage::FrenchPress),
        Some(Machine::FrenchPress),
    ),
    term(
        r"gooseneck kettle|gooseneck|kettle",
        None,
        Some(Machine::PouroverKettle),
    ),
    term(
        r"pour[- ]?over|v60|chemex|kalita(?: wave)?|filter coffee",
        Some(Beverage::Pourover),
        None,
    ),
    term(r"americano|long black", Some(Beverage::Americano), None),
    term(r"cappuccino", Some(Beverage::Cappuccino), None),
    term(r"flat white|latte", Some(Beverage::Latte), None),
    term(r"espresso|ristretto", Some(Beverage::Espresso), None),
];

static VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = TERMS
        .iter()
        .map(|t| format!("(?:{})", t.pattern))
        .collect();
    re(&format!(r"\b(?:{})\b", alternatives.join("|")))
});

static TERM_MATCHERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    TERMS
        .iter()
        .map(|t| re(&format!("^(?:{})$", t.pattern)))
        .collect()
});

/// Keywords that attribute an assistant question to a single slot.
static SLOT_KEYWORDS: Lazy<Vec<(Slot, Regex)>> = Lazy::new(|| {
    vec![
        (Slot::Beverage, re(r"\b(?:drink|beverage)\b")),
        (Slot::Machine, re(r"\b(?:machine|brewer)\b")),
        (Slot::Roast, re(r"\broast")),
        (Slot::DoseG, re(r"\b(?:dose|dosing|grams)\b")),
        (Slot::WaterTempC, re(r"\btemp(?:erature)?\b")),
        (Slot::PressureBar, re(r"\b(?:pressure|bar)\b")),
    ]
});

/// Folds a transcript into [`BrewingParameters`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterExtractor;

impl ParameterExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts parameters from every user turn, oldest first.
    pub fn extract(&self, transcript: &Transcript) -> BrewingParameters {
        let mut params = BrewingParameters::new();
        let mut pending = None;

        for turn in transcript.turns() {
            match turn.role {
                TurnRole::Assistant => pending = pending_slot(&turn.text),
                TurnRole::User => {
                    self.fold_turn(&mut params, &turn.text, pending);
                    pending = None;
                }
            }
        }

        params
    }

    /// Applies one user turn on top of `params`.
    ///
    /// `pending` is the slot the preceding assistant turn asked about, if
    /// any. A bare value ("18", "light") in the reply fills that slot when
    /// the turn does not state the field explicitly.
    pub fn fold_turn(&self, params: &mut BrewingParameters, text: &str, pending: Option<Slot>) {
        let text = text.to_lowercase();

        apply_vocabulary(params, &text);

        let roast = last_roast(&text, &[&*ROAST_BEFORE, &*ROAST_AFTER]).or_else(|| {
            (pending == Some(Slot::Roast))
                .then(|| last_roast(&text, &[&*ROAST_BARE]))
                .flatten()
        });
        if let Some(roast) = roast {
            params.roast = Some(roast);
        }

        let yield_spans = spans(&text, &[&*YIELD_AFTER, &*YIELD_CONTEXT, &*YIELD_BEFORE]);
        if let Some(grams) = last_value(&text, &[&*YIELD_AFTER, &*YIELD_CONTEXT, &*YIELD_BEFORE], &[])
        {
            params.yield_g = Some(grams);
        }

        let dose = last_value(&text, &[&*DOSE_UNIT, &*DOSE_CONTEXT], &yield_spans)
            .or_else(|| bare_if_pending(&text, pending, Slot::DoseG));
        if let Some(grams) = dose {
            params.dose_g = Some(grams);
        }

        let temp = last_temperature(&text).or_else(|| {
            bare_if_pending(&text, pending, Slot::WaterTempC).map(unitless_temperature)
        });
        if let Some(celsius) = temp {
            params.water_temp_c = Some(celsius);
        }

        let pressure = last_value(&text, &[&*PRESSURE_UNIT, &*PRESSURE_CONTEXT], &[])
            .or_else(|| bare_if_pending(&text, pending, Slot::PressureBar));
        if let Some(bar) = pressure {
            params.pressure_bar = Some(bar);
        }

        if let Some(water) = last_value(&text, &[&*RATIO], &[]).filter(|w| *w <= MAX_RATIO_MULTIPLIER)
        {
            params.ratio = Some(BrewRatio::new(1.0, water));
        }

        let seconds = last_match(&text, &TIME_SECONDS, &[]);
        let minutes = last_match(&text, &TIME_MINUTES, &[]).map(|(pos, m)| (pos, m * 60.0));
        if let Some((_, secs)) = latest(seconds, minutes) {
            params.extraction_time_s = Some(secs);
        }
    }
}

/// The slot an assistant turn asks about, if it names exactly one.
pub fn pending_slot(assistant_text: &str) -> Option<Slot> {
    let text = assistant_text.to_lowercase();
    let mut hits = SLOT_KEYWORDS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&text))
        .map(|(slot, _)| *slot);
    match (hits.next(), hits.next()) {
        (Some(slot), None) => Some(slot),
        _ => None,
    }
}

/// Applies beverage and machine mentions in reading order.
///
/// A mention that contradicts the other field drops it: naming a pourover
/// after a lever machine forgets the machine, and vice versa. A kettle
/// mention never displaces a stated beverage it cannot brew.
fn apply_vocabulary(params: &mut BrewingParameters, text: &str) {
    for found in VOCABULARY.find_iter(text) {
        let Some(term) = TERM_MATCHERS
            .iter()
            .position(|m| m.is_match(found.as_str()))
            .map(|i| &TERMS[i])
        else {
            continue;
        };

        if let Some(beverage) = term.beverage {
            params.beverage = Some(beverage);
            if term.machine.is_none()
                && params.machine.is_some_and(|m| !beverage.accepts_machine(m))
            {
                params.machine = None;
            }
        }
        if let Some(machine) = term.machine {
            if term.beverage.is_none()
                && !machine.is_brewing_device()
                && params.beverage.is_some_and(|b| !b.accepts_machine(machine))
            {
                continue;
            }
            params.machine = Some(machine);
            if term.beverage.is_none()
                && params.beverage.is_some_and(|b| !b.accepts_machine(machine))
            {
                params.beverage = None;
            }
        }
    }
}

fn parse_positive(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn spans(text: &str, patterns: &[&Regex]) -> Vec<Span<usize>> {
    patterns
        .iter()
        .flat_map(|p| p.find_iter(text).map(|m| m.range()))
        .collect()
}

/// Last positive number captured by `pattern`, with its position.
///
/// Captures whose number starts inside one of `skip` are ignored.
fn last_match(text: &str, pattern: &Regex, skip: &[Span<usize>]) -> Option<(usize, f64)> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let number = caps.get(1)?;
            if skip.iter().any(|s| s.contains(&number.start())) {
                return None;
            }
            parse_positive(number.as_str()).map(|v| (number.start(), v))
        })
        .last()
}

fn latest(a: Option<(usize, f64)>, b: Option<(usize, f64)>) -> Option<(usize, f64)> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if y.0 > x.0 { y } else { x }),
        (x, y) => x.or(y),
    }
}

/// Last positive number across several patterns, by position in the text.
fn last_value(text: &str, patterns: &[&Regex], skip: &[Span<usize>]) -> Option<f64> {
    patterns
        .iter()
        .map(|p| last_match(text, p, skip))
        .fold(None, latest)
        .map(|(_, v)| v)
}

fn bare_if_pending(text: &str, pending: Option<Slot>, slot: Slot) -> Option<f64> {
    if pending == Some(slot) {
        last_value(text, &[&*BARE_NUMBER], &[])
    } else {
        None
    }
}

fn fahrenheit_to_celsius(f: f64) -> f64 {
    round1((f - 32.0) * 5.0 / 9.0)
}

fn unitless_temperature(value: f64) -> f64 {
    if value > FAHRENHEIT_THRESHOLD {
        fahrenheit_to_celsius(value)
    } else {
        value
    }
}

fn temperature_from_unit(caps: &Captures<'_>) -> Option<(usize, f64)> {
    let number = caps.get(1)?;
    let value = parse_positive(number.as_str())?;
    let unit = caps.get(2).or_else(|| caps.get(3)).map(|u| u.as_str());
    let celsius = match unit {
        Some(u) if u.starts_with('f') => fahrenheit_to_celsius(value),
        Some(_) => value,
        None => unitless_temperature(value),
    };
    Some((number.start(), celsius))
}

fn last_temperature(text: &str) -> Option<f64> {
    let with_unit = TEMP_UNIT
        .captures_iter(text)
        .filter_map(|caps| temperature_from_unit(&caps))
        .last();
    let with_context =
        last_match(text, &TEMP_CONTEXT, &[]).map(|(pos, v)| (pos, unitless_temperature(v)));
    latest(with_unit, with_context)
        .map(|(_, v)| v)
        .filter(|v| *v > 0.0)
}

fn roast_from_word(word: &str) -> Option<Roast> {
    match word.replace('-', " ").as_str() {
        "light" | "medium light" | "blonde" | "city" => Some(Roast::Light),
        "medium" | "full city" => Some(Roast::Medium),
        "dark" | "medium dark" | "vienna" | "french" | "italian" => Some(Roast::Dark),
        _ => None,
    }
}

fn last_roast(text: &str, patterns: &[&Regex]) -> Option<Roast> {
    patterns
        .iter()
        .filter_map(|p| {
            p.captures_iter(text)
                .filter_map(|caps| {
                    let word = caps.get(1)?;
                    roast_from_word(word.as_str()).map(|r| (word.start(), r))
                })
                .last()
        })
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, roast)| roast)
}
