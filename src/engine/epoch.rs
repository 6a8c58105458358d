//! Epoch handling.
//!
//! An epoch is a fractional Gregorian year. Everything in the scene is a
//! function of it, so the type enforces the supported range once: values
//! outside `[MIN_YEAR, MAX_YEAR]` are clamped silently, never rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Earliest supported year.
pub const MIN_YEAR: f64 = 1555.0;
/// Latest supported year.
pub const MAX_YEAR: f64 = 2055.0;
/// Reference epoch of the orbital elements.
pub const J2000_YEAR: f64 = 2000.0;
/// Days per Julian year.
pub const DAYS_PER_YEAR: f64 = 365.25;
/// Hours per day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Clamp a raw year into the supported range.
///
/// NaN maps to [`MIN_YEAR`] so a poisoned input can never leak into the
/// scene.
#[must_use]
pub fn clamp_year(year: f64) -> f64 {
    if year.is_nan() {
        return MIN_YEAR;
    }
    year.clamp(MIN_YEAR, MAX_YEAR)
}

/// A clamped fractional year.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Epoch(f64);

impl Epoch {
    /// J2000 reference epoch.
    pub const J2000: Self = Self(J2000_YEAR);

    /// Create an epoch, clamping into range.
    #[must_use]
    pub fn new(year: f64) -> Self {
        Self(clamp_year(year))
    }

    /// The fractional year.
    #[must_use]
    pub const fn year(self) -> f64 {
        self.0
    }

    /// Days elapsed since J2000 (negative before).
    #[must_use]
    pub fn days_since_j2000(self) -> f64 {
        (self.0 - J2000_YEAR) * DAYS_PER_YEAR
    }

    /// Hours elapsed since J2000 (negative before).
    #[must_use]
    pub fn hours_since_j2000(self) -> f64 {
        self.days_since_j2000() * HOURS_PER_DAY
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Self::J2000
    }
}

impl From<f64> for Epoch {
    fn from(year: f64) -> Self {
        Self::new(year)
    }
}

impl From<Epoch> for f64 {
    fn from(epoch: Epoch) -> Self {
        epoch.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} CE", self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any finite input lands inside the range.
        #[test]
        fn prop_epoch_always_in_range(year in -1e6f64..1e6) {
            let e = Epoch::new(year);
            prop_assert!(e.year() >= MIN_YEAR);
            prop_assert!(e.year() <= MAX_YEAR);
        }

        /// In-range inputs are left untouched.
        #[test]
        fn prop_epoch_identity_in_range(year in MIN_YEAR..=MAX_YEAR) {
            prop_assert!((Epoch::new(year).year() - year).abs() < f64::EPSILON);
        }
    }
}
