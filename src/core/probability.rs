//! Probability arithmetic shared by the scorer, the ledger and share links.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{CoreError, RangeError};

/// Ceiling for every stored probability, in percent.
pub const MAX_PROBABILITY: f64 = 99.9;

/// Probability assigned when a share link carries no usable hint.
pub const DEFAULT_BOOTSTRAP_PROBABILITY: f64 = 60.0;

/// Bounds of a single support increment, in percentage points.
pub const MIN_INCREMENT: f64 = 1.0;
pub const MAX_INCREMENT: f64 = 10.0;

/// Clamp to `[0, MAX_PROBABILITY]`. NaN maps to zero.
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_PROBABILITY)
}

/// Map a sentiment confidence to the starting probability of a wish.
///
/// Confidence 0 gives 60%, confidence 0.95 gives 79%.
pub fn initial_probability(confidence: f64) -> f64 {
    clamp_probability(60.0 + confidence * 20.0)
}

/// Reject probabilities outside `[0, MAX_PROBABILITY]`.
pub fn check_probability(field: &'static str, value: f64) -> Result<f64, CoreError> {
    if value.is_finite() && (0.0..=MAX_PROBABILITY).contains(&value) {
        Ok(value)
    } else {
        Err(RangeError {
            field,
            value,
            min: 0.0,
            max: MAX_PROBABILITY,
        }
        .into())
    }
}

/// A strictly positive, finite amount added by one supporter.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Increment(f64);

impl Increment {
    pub fn new(value: f64) -> Result<Self, CoreError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(RangeError {
                field: "increment",
                value,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            }
            .into())
        }
    }

    /// Fresh draw from `[MIN_INCREMENT, MAX_INCREMENT]`, rounded to one decimal.
    pub fn random() -> Self {
        Self::random_with(&mut rand::rng())
    }

    pub fn random_with<R: Rng>(rng: &mut R) -> Self {
        let raw = rng.random_range(MIN_INCREMENT..=MAX_INCREMENT);
        Self(round_tenth(raw).clamp(MIN_INCREMENT, MAX_INCREMENT))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Increment {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Increment> for f64 {
    fn from(value: Increment) -> Self {
        value.0
    }
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Caller-facing helper: one random support increment.
pub fn random_increment() -> f64 {
    Increment::random().value()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
