//! chartconv CLI
//!
//! Converts DJ Hero charts between FSGMUB, XMK, CSV and CHART.

use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use env_logger::{Env, Target};
use log::info;

use chartconv::cli::{commands, Cli};
use chartconv::ChartError;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Help and version requests are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Stdout)
        .init();

    info!("chartconv v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = cli.options().context("Failed to load options")?;
    commands::convert(&cli.input, &options)
        .with_context(|| format!("Failed to convert {}", cli.input.display()))?;
    Ok(())
}

fn report(err: &anyhow::Error) {
    eprintln!("Error: {:#}", err);

    let Some(chart_err) = err.downcast_ref::<ChartError>() else {
        return;
    };
    if let Some(hint) = chart_err.recovery_suggestion() {
        eprintln!("{}", hint);
    }
    if chart_err.is_usage_error() {
        eprintln!();
        let _ = Cli::command().print_help();
    }
}
