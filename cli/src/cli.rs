//! # CLI Interface
//!
//! Command-line structure for the `lockbox` binary, built with `clap`
//! derive. Four subcommands: `keygen`, `sign`, `simulate` and `version`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lockbox_protocol::config::DEFAULT_CHAIN_ID;
use lockbox_protocol::types::{Address, LockboxId, ReferenceId};

use crate::logging::LogFormat;

/// Lockbox authorization tooling.
///
/// Generates delegated authorization keys, signs vault operations for a
/// lockbox holder to submit, and replays JSON scenarios against an
/// in-memory vault.
#[derive(Parser, Debug)]
#[command(
    name = "lockbox",
    about = "Lockbox authorization tooling and vault simulator",
    version,
    propagate_version = true
)]
pub struct LockboxCli {
    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "LOCKBOX_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new authorization key and print it as JSON.
    Keygen,
    /// Sign an operation for a lockbox holder to submit.
    Sign(SignArgs),
    /// Run a JSON scenario against a fresh chain and vault.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `sign` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    /// Hex-encoded authorization secret key.
    ///
    /// Prefer the environment variable over the flag so the secret stays
    /// out of shell history.
    #[arg(long, env = "LOCKBOX_AUTH_KEY", hide_env_values = true)]
    pub key: String,

    /// Chain id of the vault deployment.
    #[arg(long, env = "LOCKBOX_CHAIN_ID", default_value_t = DEFAULT_CHAIN_ID)]
    pub chain_id: u64,

    /// Address of the vault contract.
    #[arg(long, env = "LOCKBOX_VAULT_ADDRESS")]
    pub vault: Address,

    #[arg(long)]
    pub lockbox_id: LockboxId,

    /// The lockbox's current nonce.
    #[arg(long)]
    pub nonce: u64,

    /// Holder account that will submit the operation.
    #[arg(long)]
    pub caller: Address,

    /// Correlation tag. A random one is generated when omitted.
    #[arg(long)]
    pub reference_id: Option<ReferenceId>,

    /// Absolute expiry in unix seconds. Overrides `--validity`.
    #[arg(long)]
    pub expiry: Option<u64>,

    /// Seconds from now until the signature expires.
    #[arg(long, default_value_t = 3_600)]
    pub validity: u64,

    /// JSON file holding the operation parameters.
    #[arg(long, short = 'p')]
    pub params: PathBuf,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Scenario JSON file.
    pub scenario: PathBuf,
}
