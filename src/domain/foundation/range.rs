//! Inclusive numeric range value object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive real interval with `min <= max` guaranteed by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    min: f64,
    max: f64,
}

impl Range {
    /// Creates a range, ordering the bounds if they arrive reversed.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// A degenerate range holding a single value.
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Returns true if `value` lies within the bounds (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Forces `value` to the nearest bound when it falls outside.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Multiplies both bounds by a non-negative factor.
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    /// Rounds both bounds to one decimal place.
    pub fn rounded(&self) -> Self {
        Self::new(round1(self.min), round1(self.max))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}–{}", self.min, self.max)
        }
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_reversed_bounds() {
        let r = Range::new(5.0, 2.0);
        assert_eq!(r.min(), 2.0);
        assert_eq!(r.max(), 5.0);
    }

    #[test]
    fn contains_is_inclusive() {
        let r = Range::new(94.0, 96.0);
        assert!(r.contains(94.0));
        assert!(r.contains(96.0));
        assert!(!r.contains(96.1));
    }

    #[test]
    fn clamp_pulls_to_nearest_bound() {
        let r = Range::new(80.0, 100.0);
        assert_eq!(r.clamp(150.0), 100.0);
        assert_eq!(r.clamp(20.0), 80.0);
        assert_eq!(r.clamp(93.0), 93.0);
    }

    #[test]
    fn scale_multiplies_bounds() {
        let r = Range::new(2.0, 2.5).scale(18.0);
        assert_eq!(r, Range::new(36.0, 45.0));
    }

    #[test]
    fn displays_point_without_dash() {
        assert_eq!(Range::point(7.0).to_string(), "7");
        assert_eq!(Range::new(25.0, 32.0).to_string(), "25–32");
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        assert_eq!(round1(39.6000001), 39.6);
        assert_eq!(Range::new(1.04, 2.26).rounded(), Range::new(1.0, 2.3));
    }
}
