// Command handler for: Export
//
// Writes the normalized observed data next to the simulated null
// distribution so both can be plotted from one CSV.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use miette::IntoDiagnostic;
use serde_json::json;
use tracing::info;

use shinychain_prob::distribution::normalize;
use shinychain_prob::export::write_distributions;
use shinychain_prob::hypothesis::null_distribution;

use super::helpers::{hypothesis_config, load_observed, parse_output_format};
use crate::cli::SimulationArgs;
use crate::types::OutputFormat;

/// Handler for the `export` subcommand.
pub(crate) fn run_export_command(args: &SimulationArgs, out: PathBuf) -> miette::Result<()> {
    let format = parse_output_format(&args.format);
    let observed = load_observed(args.observed.as_deref())?;
    let config = hypothesis_config(args)?;

    let observed_dist = normalize(&observed.distribution()).into_diagnostic()?;
    let null = null_distribution(&config).into_diagnostic()?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let file = File::create(&out).into_diagnostic()?;
    write_distributions(&[&observed_dist, &null], BufWriter::new(file)).into_diagnostic()?;
    info!("Distributions written to {}", out.display());

    match format {
        OutputFormat::Text => println!(
            "Wrote observed and {} null distributions to {} (seed {}).",
            config.model,
            out.display(),
            config.seed
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "out": out.display().to_string(),
                "model": config.model,
                "seed": config.seed,
                "null_samples": config.null_samples,
                "columns": ["key", "observed", "null"],
            }))
            .into_diagnostic()?
        ),
    }
    Ok(())
}
