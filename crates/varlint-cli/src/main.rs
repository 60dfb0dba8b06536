//! varlint: check Terraform variable declarations against a catalog of
//! interface specifications.
//!
//! # Usage
//!
//! ```bash
//! varlint check infra/ --config catalog.toml
//! varlint stub --config catalog.toml kind
//! ```
//!
//! Exit status is 0 when no error-severity issue was found, 1 when at least
//! one was, and 2 when checking could not complete.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli_args;
mod commands;
mod report;

use cli_args::{Cli, Commands};
use commands::check::Outcome;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,varlint_kernel=debug,varlint_cli=debug",
        _ => "warn,varlint_kernel=trace,varlint_cli=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Check {
            dir,
            recursive,
            format,
        } => commands::check::run(cli.config.as_deref(), dir, *recursive, *format, &mut stdout),
        Commands::Stub { names } => {
            commands::stub::run(cli.config.as_deref(), names, &mut stdout).map(|()| Outcome::Clean)
        }
    };

    match result {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
