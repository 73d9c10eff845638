// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tracewerk — raster to SVG vectorizer.
//
// Entry point. Initialises logging, parses the command line and dispatches to
// the subcommand handlers.

mod cli;
mod commands;
mod settings;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Command};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "Tracewerk starting");

    let ok = match &cli.command {
        Command::Convert {
            input,
            output,
            options,
        } => commands::convert(input, output.as_deref(), options),
        Command::Batch {
            input_dir,
            output_dir,
            jobs,
            report,
            options,
        } => commands::batch(
            input_dir.clone(),
            output_dir.clone(),
            *jobs,
            report.as_deref(),
            options,
        ),
        Command::Config { write, options } => commands::config(write.as_deref(), options),
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
