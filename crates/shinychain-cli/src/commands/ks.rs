// Command handler for: Ks

use miette::IntoDiagnostic;

use shinychain_prob::hypothesis::run_ks_test;

use super::helpers::{emit_report, hypothesis_config, load_observed, parse_output_format};
use crate::cli::SimulationArgs;

/// Handler for the `ks` subcommand.
pub(crate) fn run_ks_command(args: &SimulationArgs, critical_value: f64) -> miette::Result<()> {
    let format = parse_output_format(&args.format);
    let observed = load_observed(args.observed.as_deref())?;
    let mut config = hypothesis_config(args)?;
    config.ks_critical_value = critical_value;

    let report = run_ks_test(&config, &observed).into_diagnostic()?;
    emit_report(&report, format)
}
