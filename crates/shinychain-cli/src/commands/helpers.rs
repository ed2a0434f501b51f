// Shared helpers for subcommand handlers: argument parsing, input loading,
// config assembly and report output.

use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;
use tracing::info;

use shinychain_prob::{BinSpec, HypothesisConfig, ObservedData, ProbabilityModel};

use crate::cli::SimulationArgs;
use crate::types::OutputFormat;

const REFERENCE_OBSERVED: &str = include_str!("../../data/reference_observed.json");

pub(crate) fn parse_output_format(raw: &str) -> OutputFormat {
    match raw {
        "text" => OutputFormat::Text,
        "json" => OutputFormat::Json,
        other => {
            eprintln!("Unknown output format: {other}. Use 'text' or 'json'.");
            std::process::exit(1);
        }
    }
}

pub(crate) fn parse_model(raw: &str) -> miette::Result<ProbabilityModel> {
    raw.parse::<ProbabilityModel>().into_diagnostic()
}

/// Observed counts from `path`, or the bundled reference dataset.
pub(crate) fn load_observed(path: Option<&Path>) -> miette::Result<ObservedData> {
    match path {
        Some(path) => {
            let source = std::fs::read_to_string(path).into_diagnostic()?;
            serde_json::from_str(&source).map_err(|e| {
                miette::miette!("Invalid observed data in {}: {e}", path.display())
            })
        }
        None => serde_json::from_str(REFERENCE_OBSERVED).into_diagnostic(),
    }
}

/// Assemble a run configuration; draws a seed when none was given.
pub(crate) fn hypothesis_config(args: &SimulationArgs) -> miette::Result<HypothesisConfig> {
    let seed = match args.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            info!(seed, "No --seed given; drew a fresh one");
            seed
        }
    };
    Ok(HypothesisConfig {
        model: parse_model(&args.model)?,
        null_samples: args.null_samples,
        bin: BinSpec::new(args.bin_width).into_diagnostic()?,
        seed,
        ..HypothesisConfig::default()
    })
}

pub(crate) fn emit_report<T>(report: &T, format: OutputFormat) -> miette::Result<()>
where
    T: Serialize + std::fmt::Display,
{
    match format {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?)
        }
    }
    Ok(())
}
