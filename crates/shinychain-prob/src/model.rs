use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain length from which the length-dependent model stops growing.
pub const LENGTH_DEPENDENT_THRESHOLD: u64 = 40;

/// Success probability for chains at or beyond [`LENGTH_DEPENDENT_THRESHOLD`].
pub const LENGTH_DEPENDENT_CEILING: f64 = 0.05;

/// Success probability of the flat-rate model.
pub const CONSTANT_RATE: f64 = 1.0 / 308.0;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Chain length must be positive, got {0}")]
    NonPositiveLength(u64),
    #[error("Unknown probability model '{0}' (expected 'flat' or 'dependent')")]
    UnknownModel(String),
}

/// Success probability of a single step, as a function of the chain length
/// reached so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbabilityModel {
    /// Flat `1/308` regardless of length.
    ConstantRate,
    /// Piecewise model: closed-form rational below length 40, `0.05` after.
    LengthDependent,
}

impl ProbabilityModel {
    /// Probability that the step at `length` ends the chain.
    ///
    /// # Parameters
    /// - `length`: 1-based position in the chain.
    ///
    /// # Returns
    /// A probability in `[0, 1]`, or [`ModelError::NonPositiveLength`] for 0.
    pub fn probability(&self, length: u64) -> Result<f64, ModelError> {
        if length == 0 {
            return Err(ModelError::NonPositiveLength(length));
        }
        Ok(match self {
            ProbabilityModel::ConstantRate => CONSTANT_RATE,
            ProbabilityModel::LengthDependent => length_dependent(length),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProbabilityModel::ConstantRate => "constant-rate",
            ProbabilityModel::LengthDependent => "length-dependent",
        }
    }
}

impl fmt::Display for ProbabilityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProbabilityModel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "constant" | "constant-rate" | "binomial" => Ok(Self::ConstantRate),
            "dependent" | "length-dependent" => Ok(Self::LengthDependent),
            other => Err(ModelError::UnknownModel(other.to_string())),
        }
    }
}

// Caller guarantees length >= 1, so the `< 40` branch never divides by zero.
fn length_dependent(length: u64) -> f64 {
    if length >= LENGTH_DEPENDENT_THRESHOLD {
        return LENGTH_DEPENDENT_CEILING;
    }
    let numerator = (14747 - 40 * length) as f64;
    let denominator = (2_621_440 * (41 - length)) as f64;
    numerator / denominator
}
