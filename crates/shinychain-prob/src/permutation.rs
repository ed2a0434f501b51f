use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::comparison::{rmse, ComparisonError};
use crate::distribution::{align, bin, build_raw_distribution, normalize, BinSpec};
use crate::distribution::{Distribution, DistributionError};
use crate::model::ProbabilityModel;
use crate::sampler::seeded_stream;

/// Stream id reserved for the null distribution; trial `i` uses `i + 1`.
pub const NULL_STREAM: u64 = 0;

#[derive(Debug, Error, PartialEq)]
pub enum PermutationError {
    #[error("Trial count must be positive")]
    ZeroTrials,
    #[error("Sample size must be positive")]
    ZeroSampleSize,
    #[error("Observed error must be finite, got {0}")]
    NonFiniteObservedError(f64),
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),
    #[error("Comparison error: {0}")]
    Comparison(#[from] ComparisonError),
}

/// Parameters shared by every resampling trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PermutationConfig {
    /// Number of simulated datasets.
    pub trials: u64,
    /// Chains per simulated dataset; matches the observed sample size.
    pub sample_size: u64,
    pub bin: BinSpec,
    pub model: ProbabilityModel,
    pub seed: u64,
}

/// Generator stream used by trial `index` (0-based).
pub fn trial_stream(index: u64) -> u64 {
    index + 1
}

/// RMSE of one simulated dataset against `null`.
///
/// Each trial owns a generator derived from `(seed, index)`, so trials can
/// run in any order and still produce the same errors.
pub fn trial_error(
    config: &PermutationConfig,
    index: u64,
    null: &Distribution,
) -> Result<f64, PermutationError> {
    let mut rng = seeded_stream(config.seed, trial_stream(index));
    let raw = build_raw_distribution(config.sample_size, config.model, &mut rng)?;
    let simulated = normalize(&bin(&raw, config.bin))?;
    let (simulated, null) = align(&simulated, null);
    Ok(rmse(&simulated, &null)?)
}

/// Count how many of `config.trials` simulated datasets deviate from `null`
/// by at least `observed_error`.
///
/// Dividing the count by the number of trials gives the empirical p-value
/// of the observed data under the null model. `null` is only read; each
/// trial aligns against its own copy.
pub fn count_worse_than_observed(
    config: &PermutationConfig,
    observed_error: f64,
    null: &Distribution,
) -> Result<u64, PermutationError> {
    if config.trials == 0 {
        return Err(PermutationError::ZeroTrials);
    }
    if config.sample_size == 0 {
        return Err(PermutationError::ZeroSampleSize);
    }
    if !observed_error.is_finite() {
        return Err(PermutationError::NonFiniteObservedError(observed_error));
    }

    let mut worse = 0u64;
    for index in 0..config.trials {
        if trial_error(config, index, null)? >= observed_error {
            worse += 1;
        }
        if (index + 1) % 100 == 0 {
            debug!(
                completed = index + 1,
                trials = config.trials,
                worse,
                "permutation progress"
            );
        }
    }
    Ok(worse)
}
