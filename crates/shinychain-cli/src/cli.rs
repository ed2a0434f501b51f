//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Monte Carlo hypothesis tests for chain lengths to a rare success.\n\n\
    Typical session:\n  \
    1. shinychain rmse --seed 42\n  \
    2. shinychain ks --seed 42\n  \
    3. shinychain export --seed 42 --out dists.csv\n\n\
    Without --observed, the bundled reference dataset (69 chains, bins of 20) is used.\n\
    Use --model to pick the null model (dependent, flat).";

#[derive(Parser)]
#[command(name = "shinychain")]
#[command(about = "Monte Carlo hypothesis tests for chain-length distributions")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) sim: SimulationArgs,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub(crate) struct SimulationArgs {
    /// Observed counts as a JSON object of bin label -> count (default: bundled reference data)
    #[arg(long, global = true)]
    pub(crate) observed: Option<PathBuf>,

    /// Null probability model: dependent | flat
    #[arg(long, global = true, default_value = "dependent")]
    pub(crate) model: String,

    /// Chains simulated for the null distribution
    #[arg(long, global = true, default_value_t = 10_000)]
    pub(crate) null_samples: u64,

    /// Width of the bins used for simulated chains
    #[arg(long, global = true, default_value_t = 20)]
    pub(crate) bin_width: u64,

    /// Random seed (a fresh one is drawn and reported when omitted)
    #[arg(long, global = true)]
    pub(crate) seed: Option<u64>,

    /// Output format: text | json
    #[arg(long, global = true, default_value = "text")]
    pub(crate) format: String,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// RMSE permutation test of the observed data against the null model
    #[command(display_order = 10)]
    Rmse {
        /// Number of resampled datasets
        #[arg(long, default_value_t = 1_000)]
        trials: u64,
    },

    /// Two-sample Kolmogorov-Smirnov test of the observed data against the null model
    #[command(display_order = 20)]
    Ks {
        /// Critical value for the chosen significance level (1.95 ~ alpha 0.001)
        #[arg(long, default_value_t = shinychain_prob::hypothesis::DEFAULT_KS_CRITICAL_VALUE)]
        critical_value: f64,
    },

    /// Write the observed and null distributions as CSV for plotting
    #[command(display_order = 30)]
    Export {
        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },
}
