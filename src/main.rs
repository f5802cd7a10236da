//! labup - learning-lab environment bootstrapper
//!
//! Brings a local database learning-lab environment into a ready state:
//! - selects a Python runtime (python3, falling back to python)
//! - creates or reuses a virtual environment
//! - installs only the missing requirements, in one batch
//! - ensures the lab database service is running via docker compose

use clap::Parser;
use colored::Colorize;
use labup::bootstrap::Bootstrapper;
use labup::cli::CliArgs;
use labup::output::{create_formatter, OutputConfig};
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("labup v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Project: {}", args.path.display());
        if args.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let bootstrapper = Bootstrapper::new(args.clone());
    let result = bootstrapper.run().await;

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.dry_run);
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter.format(&result, &mut stdout)?;
    stdout.flush()?;

    // Report goes to stdout, fatal diagnostics to stderr.
    if let Some(error) = &result.error {
        eprintln!("{} {}", "✗".red(), error.to_string().red());
    }

    if result.succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
