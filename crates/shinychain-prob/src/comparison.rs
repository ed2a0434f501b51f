use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distribution::Distribution;

#[derive(Debug, Error, PartialEq)]
pub enum ComparisonError {
    #[error("Distributions must share key sets ({left} vs {right} keys); align them first")]
    MisalignedKeys { left: usize, right: usize },
    #[error("Cannot compare empty distributions")]
    EmptyDistribution,
    #[error("Sample sizes must be positive (got {n_a} and {n_b})")]
    ZeroSampleSize { n_a: u64, n_b: u64 },
    #[error("Critical value must be positive and finite, got {0}")]
    InvalidCriticalValue(f64),
}

fn require_aligned(a: &Distribution, b: &Distribution) -> Result<(), ComparisonError> {
    if !a.same_keys(b) {
        return Err(ComparisonError::MisalignedKeys {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(ComparisonError::EmptyDistribution);
    }
    Ok(())
}

/// Root-mean-square deviation of `a` from the baseline `b`.
///
/// Both inputs must already be aligned (see [`crate::distribution::align`]);
/// missing keys are reported as [`ComparisonError::MisalignedKeys`] rather
/// than treated as zero.
pub fn rmse(a: &Distribution, b: &Distribution) -> Result<f64, ComparisonError> {
    require_aligned(a, b)?;
    let sum_sq: f64 = a
        .iter()
        .zip(b.values())
        .map(|((_, x), y)| (x - y).powi(2))
        .sum();
    Ok((sum_sq / a.len() as f64).sqrt())
}

/// Outcome of a two-sample Kolmogorov–Smirnov comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsOutcome {
    /// Largest absolute gap between the two cumulative distributions.
    pub statistic: f64,
    /// `critical_value * sqrt((n_a + n_b) / (n_a * n_b))`.
    pub threshold: f64,
    pub critical_value: f64,
    pub n_a: u64,
    pub n_b: u64,
    /// Whether `statistic > threshold`.
    pub reject: bool,
}

/// Two-sample Kolmogorov–Smirnov test on cumulative distributions over an
/// aligned key set.
///
/// # Parameters
/// - `cdf_a`, `cdf_b`: cumulative proportions sharing the same keys.
/// - `n_a`, `n_b`: sample sizes behind each distribution.
/// - `critical_value`: coefficient for the chosen significance level
///   (about 1.95 for alpha = 0.001).
///
/// # Returns
/// The statistic, the scaled threshold and the reject decision.
pub fn kolmogorov_two_sample(
    cdf_a: &Distribution,
    n_a: u64,
    cdf_b: &Distribution,
    n_b: u64,
    critical_value: f64,
) -> Result<KsOutcome, ComparisonError> {
    require_aligned(cdf_a, cdf_b)?;
    if n_a == 0 || n_b == 0 {
        return Err(ComparisonError::ZeroSampleSize { n_a, n_b });
    }
    if !(critical_value.is_finite() && critical_value > 0.0) {
        return Err(ComparisonError::InvalidCriticalValue(critical_value));
    }

    let statistic = cdf_a
        .values()
        .zip(cdf_b.values())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0_f64, f64::max);
    let (na, nb) = (n_a as f64, n_b as f64);
    let threshold = critical_value * ((na + nb) / (na * nb)).sqrt();

    Ok(KsOutcome {
        statistic,
        threshold,
        critical_value,
        n_a,
        n_b,
        reject: statistic > threshold,
    })
}
