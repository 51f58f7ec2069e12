//! The one tunable the engine accepts: the similarity threshold.
//!
//! At the boundary the threshold is a whole percentage in `[50, 100]`; the
//! clustering stage works on the ratio in `(0, 1]`.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_THRESHOLD_PERCENT: f64 = 50.0;
pub const MAX_THRESHOLD_PERCENT: f64 = 100.0;
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    /// Build from a ratio in `(0, 1]`.
    pub fn new(ratio: f64) -> Result<Self, EngineError> {
        if ratio.is_finite() && ratio > 0.0 && ratio <= 1.0 {
            Ok(Self(ratio))
        } else {
            Err(EngineError::InvalidThreshold { value: ratio })
        }
    }

    /// Build from a user-facing percentage in `[50, 100]`.
    pub fn from_percent(percent: f64) -> Result<Self, EngineError> {
        if (MIN_THRESHOLD_PERCENT..=MAX_THRESHOLD_PERCENT).contains(&percent) {
            Ok(Self(percent / 100.0))
        } else {
            Err(EngineError::InvalidThreshold { value: percent })
        }
    }

    pub fn ratio(self) -> f64 {
        self.0
    }

    /// The ratio as a percentage, rounded to two decimals.
    pub fn percent(self) -> f64 {
        (self.0 * 10_000.0).round() / 100.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD_PERCENT / 100.0)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = EngineError;

    fn try_from(ratio: f64) -> Result<Self, Self::Error> {
        Self::new(ratio)
    }
}

impl From<Threshold> for f64 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}
