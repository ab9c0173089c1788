//! MB license key generator.
//!
//! Usage:
//!   mb-keygen generate [PREMIUM|TRIAL] [TRIAL_DAYS]
//!   mb-keygen validate <KEY>
//!   mb-keygen batch [COUNT]
//!   mb-keygen heartbeat <FILE>
//!
//! The checksum secret comes from `--secret` or `MB_LICENSE_SECRET`.

use std::process::ExitCode;

use clap::Parser;
use mb_keygen::Cli;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries keys only.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    debug!(command = ?cli.command, "starting");

    match mb_keygen::run(&cli) {
        Ok(report) => {
            print!("{}", report.output);
            if report.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
