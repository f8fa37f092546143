#![deny(missing_docs)]

//! # NCF Patch CLI
//!
//! Command Line Interface for rolling NCF expiry dates out across the
//! point-of-sale front end.
//!
//! Supported Commands:
//! - `apply`: Runs a patch plan against a project tree.
//! - `check`: Reports whether a plan still has pending changes, without writing.
//! - `expiry`: Classifies expiry dates the way the POS screens show them.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod apply;
mod display;
mod error;
mod expiry;

#[derive(Parser, Debug)]
#[clap(author, version, about = "NCF expiry rollout tool")]
struct Cli {
    /// Log debug output.
    #[clap(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[clap(short, long, global = true)]
    quiet: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a patch plan to a project tree.
    Apply(apply::ApplyArgs),
    /// Dry-run a patch plan and fail if anything is still pending.
    Check(apply::CheckArgs),
    /// Classify NCF expiry dates.
    Expiry(expiry::ExpiryArgs),
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> error::CliResult<bool> {
    match &cli.command {
        Commands::Apply(args) => apply::execute(args),
        Commands::Check(args) => apply::check(args),
        Commands::Expiry(args) => expiry::execute(args).map(|_| true),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(2)
        }
    }
}
