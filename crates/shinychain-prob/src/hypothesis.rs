//! End-to-end hypothesis tests of an observed chain-length dataset against a
//! simulated null distribution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::comparison::{kolmogorov_two_sample, rmse, ComparisonError, KsOutcome};
use crate::distribution::{
    align, bin, build_raw_distribution, cumulative, normalize, BinSpec, Distribution,
    DistributionError,
};
use crate::model::ProbabilityModel;
use crate::permutation::{
    count_worse_than_observed, PermutationConfig, PermutationError, NULL_STREAM,
};
use crate::sampler::seeded_stream;

/// Critical value for alpha of roughly 0.001.
pub const DEFAULT_KS_CRITICAL_VALUE: f64 = 1.95;

#[derive(Debug, Error, PartialEq)]
pub enum HypothesisError {
    #[error("Observed data must contain at least one positive count")]
    EmptyObservation,
    #[error("Observed bin label must be positive, got {0}")]
    InvalidBinLabel(u64),
    #[error("Observed counts sum past u64::MAX")]
    SampleSizeOverflow,
    #[error("Observed bin label {label} is not a multiple of bin width {width}")]
    MisalignedBinLabel { label: u64, width: u64 },
    #[error("Null sample count must be positive")]
    ZeroNullSamples,
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),
    #[error("Comparison error: {0}")]
    Comparison(#[from] ComparisonError),
    #[error("Permutation error: {0}")]
    Permutation(#[from] PermutationError),
}

/// Observed counts keyed by bin label, already binned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u64, u64>", into = "BTreeMap<u64, u64>")]
pub struct ObservedData {
    counts: BTreeMap<u64, u64>,
    sample_size: u64,
}

impl ObservedData {
    pub fn new(counts: BTreeMap<u64, u64>) -> Result<Self, HypothesisError> {
        if let Some(&label) = counts.keys().find(|&&label| label == 0) {
            return Err(HypothesisError::InvalidBinLabel(label));
        }
        let sample_size = counts
            .values()
            .try_fold(0u64, |total, &c| total.checked_add(c))
            .ok_or(HypothesisError::SampleSizeOverflow)?;
        if sample_size == 0 {
            return Err(HypothesisError::EmptyObservation);
        }
        Ok(Self {
            counts,
            sample_size,
        })
    }

    pub fn counts(&self) -> &BTreeMap<u64, u64> {
        &self.counts
    }

    /// Total number of observed chains.
    pub fn sample_size(&self) -> u64 {
        self.sample_size
    }

    /// Every bin label must be a bucket of `spec`, or the observed labels
    /// can never line up with simulated ones.
    pub fn check_bin_labels(&self, spec: BinSpec) -> Result<(), HypothesisError> {
        let width = spec.width();
        match self.counts.keys().find(|&&label| label % width != 0) {
            Some(&label) => Err(HypothesisError::MisalignedBinLabel { label, width }),
            None => Ok(()),
        }
    }

    pub fn distribution(&self) -> Distribution {
        Distribution::from_counts(self.counts.iter().map(|(&k, &v)| (k, v)))
    }
}

impl TryFrom<BTreeMap<u64, u64>> for ObservedData {
    type Error = HypothesisError;

    fn try_from(counts: BTreeMap<u64, u64>) -> Result<Self, Self::Error> {
        Self::new(counts)
    }
}

impl From<ObservedData> for BTreeMap<u64, u64> {
    fn from(data: ObservedData) -> Self {
        data.counts
    }
}

/// Everything needed to reproduce one hypothesis test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisConfig {
    pub model: ProbabilityModel,
    /// Chains simulated for the null distribution.
    pub null_samples: u64,
    /// Resampled datasets in the permutation test.
    pub trials: u64,
    pub bin: BinSpec,
    pub seed: u64,
    pub ks_critical_value: f64,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            model: ProbabilityModel::LengthDependent,
            null_samples: 10_000,
            trials: 1_000,
            bin: BinSpec::REFERENCE,
            seed: 0,
            ks_critical_value: DEFAULT_KS_CRITICAL_VALUE,
        }
    }
}

/// Binned, normalized distribution of `config.null_samples` simulated chains.
pub fn null_distribution(config: &HypothesisConfig) -> Result<Distribution, HypothesisError> {
    if config.null_samples == 0 {
        return Err(HypothesisError::ZeroNullSamples);
    }
    let mut rng = seeded_stream(config.seed, NULL_STREAM);
    let raw = build_raw_distribution(config.null_samples, config.model, &mut rng)?;
    Ok(normalize(&bin(&raw, config.bin))?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmseReport {
    pub model: ProbabilityModel,
    pub seed: u64,
    pub sample_size: u64,
    pub null_samples: u64,
    pub observed_error: f64,
    pub trials: u64,
    pub worse_count: u64,
    /// `worse_count / trials`.
    pub p_value: f64,
}

impl fmt::Display for RmseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RMSE permutation test ({} model):", self.model)?;
        writeln!(
            f,
            "  Observed sample: {} chains; null: {} chains",
            self.sample_size, self.null_samples
        )?;
        writeln!(f, "  Observed RMSE vs null: {:.6}", self.observed_error)?;
        writeln!(
            f,
            "  {} out of {} distributions were further off the null hypothesis than the observed data.",
            self.worse_count, self.trials
        )?;
        write!(f, "  Empirical p-value: {:.4} (seed {})", self.p_value, self.seed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KsReport {
    pub model: ProbabilityModel,
    pub seed: u64,
    #[serde(flatten)]
    pub outcome: KsOutcome,
}

impl fmt::Display for KsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.outcome;
        writeln!(f, "Kolmogorov-Smirnov two-sample test ({} model):", self.model)?;
        writeln!(f, "  Sample sizes: observed {}, null {}", o.n_a, o.n_b)?;
        writeln!(f, "  D = {:.6}", o.statistic)?;
        writeln!(
            f,
            "  Threshold = {:.6} (critical value {})",
            o.threshold, o.critical_value
        )?;
        let verdict = if o.reject {
            "reject the null hypothesis"
        } else {
            "do not reject the null hypothesis"
        };
        write!(f, "  Decision: {verdict} (seed {})", self.seed)
    }
}

/// RMSE of the observed proportions against the null, followed by the
/// permutation count over `config.trials` simulated datasets.
pub fn run_rmse_test(
    config: &HypothesisConfig,
    observed: &ObservedData,
) -> Result<RmseReport, HypothesisError> {
    observed.check_bin_labels(config.bin)?;
    let sample_size = observed.sample_size();
    info!(
        model = %config.model,
        seed = config.seed,
        sample_size,
        null_samples = config.null_samples,
        "Building null distribution..."
    );
    let null = null_distribution(config)?;
    let observed_dist = normalize(&observed.distribution())?;
    let (observed_dist, aligned_null) = align(&observed_dist, &null);
    let observed_error = rmse(&observed_dist, &aligned_null)?;
    info!(observed_error, trials = config.trials, "Running permutation trials...");

    let permutation = PermutationConfig {
        trials: config.trials,
        sample_size,
        bin: config.bin,
        model: config.model,
        seed: config.seed,
    };
    let worse_count = count_worse_than_observed(&permutation, observed_error, &null)?;
    let p_value = worse_count as f64 / config.trials as f64;
    info!(worse_count, p_value, "Permutation test complete");

    Ok(RmseReport {
        model: config.model,
        seed: config.seed,
        sample_size,
        null_samples: config.null_samples,
        observed_error,
        trials: config.trials,
        worse_count,
        p_value,
    })
}

/// Two-sample KS test of the observed data against the null distribution.
pub fn run_ks_test(
    config: &HypothesisConfig,
    observed: &ObservedData,
) -> Result<KsReport, HypothesisError> {
    observed.check_bin_labels(config.bin)?;
    info!(
        model = %config.model,
        seed = config.seed,
        null_samples = config.null_samples,
        "Building null distribution..."
    );
    let null = null_distribution(config)?;
    let observed_dist = normalize(&observed.distribution())?;
    let (observed_dist, null) = align(&observed_dist, &null);
    let outcome = kolmogorov_two_sample(
        &cumulative(&observed_dist),
        observed.sample_size(),
        &cumulative(&null),
        config.null_samples,
        config.ks_critical_value,
    )?;
    info!(
        statistic = outcome.statistic,
        threshold = outcome.threshold,
        reject = outcome.reject,
        "KS test complete"
    );
    Ok(KsReport {
        model: config.model,
        seed: config.seed,
        outcome,
    })
}
