//! logscope -- command-line front end for time-bucketed log browsing.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use logscope_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let writer = OutputWriter::new(cli.output);

    match run(cli, &writer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    let loaded = commands::load_config(config_path).await;

    // `config validate` reports a broken file itself, so logging falls back to defaults.
    let general = match &loaded {
        Ok(config) => config.general.clone(),
        Err(_) => GeneralConfig::default(),
    };
    if let Err(e) = logging::init_tracing(&general, cli.log_level.as_deref()) {
        eprintln!("warning: {e}");
    }
    tracing::debug!(command = ?cli.command, "logscope starting");

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, config_path, writer).await,
        Commands::Summary(args) => commands::summary::execute(args, &loaded?, writer).await,
        Commands::Entries(args) => commands::entries::execute(args, &loaded?, writer).await,
    }
}
