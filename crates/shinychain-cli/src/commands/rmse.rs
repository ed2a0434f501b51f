// Command handler for: Rmse
//
// Baseline-relative RMSE of the observed data, then the permutation count
// over simulated datasets of the same size.

use miette::IntoDiagnostic;

use shinychain_prob::hypothesis::run_rmse_test;

use super::helpers::{emit_report, hypothesis_config, load_observed, parse_output_format};
use crate::cli::SimulationArgs;

/// Handler for the `rmse` subcommand.
pub(crate) fn run_rmse_command(args: &SimulationArgs, trials: u64) -> miette::Result<()> {
    let format = parse_output_format(&args.format);
    let observed = load_observed(args.observed.as_deref())?;
    let mut config = hypothesis_config(args)?;
    config.trials = trials;

    let report = run_rmse_test(&config, &observed).into_diagnostic()?;
    emit_report(&report, format)
}
