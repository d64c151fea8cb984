// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Lockbox CLI
//!
//! Entry point for the `lockbox` binary. Parses CLI arguments, initializes
//! logging and runs one subcommand:
//!
//! - `keygen`: generate a delegated authorization key
//! - `sign`: sign an operation for a lockbox holder to submit
//! - `simulate`: replay a JSON scenario against an in-memory vault
//! - `version`: print build version information
//!
//! Results go to stdout as JSON; logs go to stderr.

mod cli;
mod commands;
mod logging;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use cli::{Commands, LockboxCli};

fn main() -> Result<()> {
    let cli = LockboxCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match &cli.command {
        Commands::Keygen => print_json(&commands::keygen()),
        Commands::Sign(args) => print_json(&commands::sign(args)?),
        Commands::Simulate(args) => {
            let report = commands::simulate(args)?;
            print_json(&report)?;
            if report.failed > 0 {
                tracing::warn!(failed = report.failed, "some scenario steps failed");
            }
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn print_version() {
    println!("lockbox   {}", env!("CARGO_PKG_VERSION"));
    println!(
        "domain    {} v{}",
        lockbox_protocol::config::DOMAIN_NAME,
        lockbox_protocol::config::DOMAIN_VERSION
    );
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
