mod cli;
mod commands;
mod types;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::export::run_export_command;
use commands::ks::run_ks_command;
use commands::rmse::run_rmse_command;

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rmse { trials } => run_rmse_command(&cli.sim, trials),
        Commands::Ks { critical_value } => run_ks_command(&cli.sim, critical_value),
        Commands::Export { out } => run_export_command(&cli.sim, out),
    }
}
