//! Subcommand handlers. Each returns a serializable value; `main` prints it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use lockbox_protocol::config::chain_name;
use lockbox_protocol::crypto::AuthorizationKeypair;
use lockbox_protocol::operation::{sign_operation, Domain, OperationParams, SignedOperation, SigningRequest};
use lockbox_protocol::types::{Address, ReferenceId};

use crate::cli::{SignArgs, SimulateArgs};
use crate::scenario::{Scenario, SimulationReport, Simulator};

/// A freshly generated authorization key.
#[derive(Debug, Serialize)]
pub struct GeneratedKey {
    pub address: Address,
    pub secret_key: String,
}

pub fn keygen() -> GeneratedKey {
    let key = AuthorizationKeypair::generate();
    info!(address = %key.address(), "authorization key generated");
    GeneratedKey {
        address: key.address(),
        secret_key: key.secret_key_hex(),
    }
}

/// What `lockbox sign` prints: the envelope to hand to the holder, plus
/// readable context.
#[derive(Debug, Serialize)]
pub struct SignOutput {
    pub chain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub operation: SignedOperation,
}

pub fn sign(args: &SignArgs) -> Result<SignOutput> {
    let key = AuthorizationKeypair::from_hex(&args.key).context("invalid authorization key")?;
    let params: OperationParams = load_json(&args.params)?;

    let expiry = match args.expiry {
        Some(expiry) => expiry,
        None => {
            let now = u64::try_from(Utc::now().timestamp()).context("system clock before 1970")?;
            now.checked_add(args.validity).context("expiry overflow")?
        }
    };

    let request = SigningRequest {
        lockbox_id: args.lockbox_id,
        nonce: args.nonce,
        caller: args.caller,
        reference_id: args.reference_id.unwrap_or_else(ReferenceId::random),
        expiry,
    };
    let domain = Domain::new(args.chain_id, args.vault);
    let signed = sign_operation(&key, &domain, &request, &params).context("signing failed")?;

    let output = SignOutput {
        chain: chain_name(args.chain_id),
        expires_at: signed.expires_at(),
        operation: signed,
    };
    info!(
        lockbox_id = request.lockbox_id,
        nonce = request.nonce,
        signer = %key.address(),
        chain = %output.chain,
        expiry,
        "operation signed"
    );
    Ok(output)
}

pub fn simulate(args: &SimulateArgs) -> Result<SimulationReport> {
    let scenario: Scenario = load_json(&args.scenario)?;
    let mut simulator = Simulator::new(&scenario)?;
    let report = simulator.run(&scenario.steps);
    info!(
        steps = report.steps.len(),
        failed = report.failed,
        lockboxes = report.lockboxes.len(),
        "simulation finished"
    );
    Ok(report)
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
