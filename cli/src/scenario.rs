//! # Scenario Simulator
//!
//! Replays a JSON scenario against a fresh in-memory chain and vault.
//!
//! A scenario declares the world (accounts, tokens, collections, routers and
//! named authorization keys) and a list of steps. `execute` steps are signed
//! automatically with the named key against the lockbox's current nonce, so
//! a scenario reads like the holder's session rather than a pile of
//! signatures. A failing step is reported and the run continues; the vault
//! has already rolled it back.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lockbox_contracts::chain::{
    Chain, CollectionBehavior, ConstantRateCall, ConstantRateRouter, FungibleToken,
    ItemCollection, TokenBehavior,
};
use lockbox_contracts::vault::{AssetBatch, CallContext, LockboxSnapshot, LockboxStatus, LockboxVault, VaultError};
use lockbox_protocol::config::{chain_name, DEFAULT_CHAIN_ID};
use lockbox_protocol::crypto::AuthorizationKeypair;
use lockbox_protocol::operation::{sign_operation, OperationParams, SignedOperation, SigningRequest};
use lockbox_protocol::types::{Address, Amount, ItemId, LockboxId, ReferenceId};

// ---------------------------------------------------------------------------
// Scenario file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub vault: Address,
    pub admin: Address,
    /// Unix seconds. Defaults to the wall clock.
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Lifetime of every signature the simulator issues.
    #[serde(default = "default_validity")]
    pub validity_secs: u64,
    /// Key name to hex secret.
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    #[serde(default)]
    pub tokens: Vec<TokenSpec>,
    #[serde(default)]
    pub collections: Vec<CollectionSpec>,
    #[serde(default)]
    pub routers: Vec<RouterSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_validity() -> u64 {
    3_600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSpec {
    pub address: Address,
    #[serde(default)]
    pub native: Amount,
    /// Models a contract without a receive hook.
    #[serde(default)]
    pub rejects_native: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSpec {
    pub address: Address,
    pub symbol: String,
    #[serde(default)]
    pub behavior: TokenBehavior,
    #[serde(default)]
    pub balances: Vec<Balance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub account: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub address: Address,
    pub name: String,
    #[serde(default)]
    pub behavior: CollectionBehavior,
    #[serde(default)]
    pub items: Vec<ItemGrant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemGrant {
    pub owner: Address,
    pub item_id: ItemId,
}

/// A constant-rate router. Fund its inventory through `accounts` and
/// token `balances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSpec {
    pub address: Address,
    pub numerator: Amount,
    pub denominator: Amount,
}

/// One scenario step, keyed by its action name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Token allowance; the spender defaults to the vault.
    Approve {
        owner: Address,
        token: Address,
        #[serde(default)]
        spender: Option<Address>,
        amount: Amount,
    },
    /// Collection-wide operator approval; the operator defaults to the vault.
    ApproveCollection {
        owner: Address,
        collection: Address,
        #[serde(default)]
        operator: Option<Address>,
    },
    AdvanceTime {
        seconds: i64,
    },
    SetDefaultMetadataUri {
        caller: Address,
        uri: String,
    },
    /// Batch creation; the native part is attached as value.
    Create {
        holder: Address,
        key: String,
        batch: AssetBatch,
    },
    Deposit {
        holder: Address,
        lockbox_id: LockboxId,
        batch: AssetBatch,
    },
    /// An authorized operation, signed with the named key.
    ///
    /// Swaps through a scenario router may leave `call_data` empty; the
    /// simulator fills in the router's constant-rate route before signing.
    Execute {
        holder: Address,
        lockbox_id: LockboxId,
        key: String,
        params: OperationParams,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Approve { .. } => "approve",
            Step::ApproveCollection { .. } => "approve_collection",
            Step::AdvanceTime { .. } => "advance_time",
            Step::SetDefaultMetadataUri { .. } => "set_default_metadata_uri",
            Step::Create { .. } => "create",
            Step::Deposit { .. } => "deposit",
            Step::Execute { .. } => "execute",
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What a successful step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepResult {
    Done,
    Created { lockbox_id: LockboxId },
    Clock { now: u64 },
    Swapped { spent: Amount, received: Amount },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepReport>,
    pub failed: usize,
    /// Live lockboxes at the end of the run.
    pub lockboxes: Vec<LockboxSnapshot>,
    pub burned: Vec<LockboxId>,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct Simulator {
    chain: Chain,
    vault: LockboxVault,
    keys: HashMap<String, AuthorizationKeypair>,
    routers: HashSet<Address>,
    created: Vec<LockboxId>,
    validity: u64,
}

impl Simulator {
    /// Build the world a scenario describes.
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let start = match scenario.start_time {
            Some(secs) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .context("start_time out of range")?,
            None => Utc::now(),
        };
        let mut chain = Chain::at(start);

        for account in &scenario.accounts {
            chain
                .mint_native(account.address, account.native)
                .with_context(|| format!("funding {}", account.address))?;
            if account.rejects_native {
                chain.reject_native(account.address);
            }
        }

        for spec in &scenario.tokens {
            chain.deploy_token(spec.address, FungibleToken::new(&spec.symbol, spec.behavior));
            for balance in &spec.balances {
                chain
                    .mint_tokens(spec.address, balance.account, balance.amount)
                    .with_context(|| format!("minting {} to {}", spec.symbol, balance.account))?;
            }
        }

        for spec in &scenario.collections {
            chain.deploy_collection(spec.address, ItemCollection::new(&spec.name, spec.behavior));
            for grant in &spec.items {
                chain
                    .mint_item(spec.address, grant.owner, grant.item_id)
                    .with_context(|| format!("minting {} #{}", spec.name, grant.item_id))?;
            }
        }

        let mut routers = HashSet::new();
        for spec in &scenario.routers {
            chain.register_router(
                spec.address,
                Arc::new(ConstantRateRouter::new(spec.numerator, spec.denominator)),
            );
            routers.insert(spec.address);
        }

        let mut keys = HashMap::new();
        for (name, secret) in &scenario.keys {
            let key = AuthorizationKeypair::from_hex(secret)
                .with_context(|| format!("invalid secret for key `{name}`"))?;
            keys.insert(name.clone(), key);
        }

        info!(
            chain = %chain_name(scenario.chain_id),
            vault = %scenario.vault,
            tokens = scenario.tokens.len(),
            collections = scenario.collections.len(),
            routers = routers.len(),
            steps = scenario.steps.len(),
            "scenario loaded"
        );

        Ok(Self {
            chain,
            vault: LockboxVault::new(scenario.vault, scenario.admin, scenario.chain_id),
            keys,
            routers,
            created: Vec::new(),
            validity: scenario.validity_secs,
        })
    }

    #[cfg(test)]
    pub fn vault(&self) -> &LockboxVault {
        &self.vault
    }

    #[cfg(test)]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Run every step in order and collect the outcome.
    pub fn run(&mut self, steps: &[Step]) -> SimulationReport {
        let mut reports = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let action = step.action();
            match self.apply(index, step) {
                Ok(result) => {
                    info!(index, action, ?result, "step committed");
                    reports.push(StepReport {
                        index,
                        action,
                        result: Some(result),
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(index, action, error = %format!("{err:#}"), "step failed");
                    reports.push(StepReport {
                        index,
                        action,
                        result: None,
                        error: Some(format!("{err:#}")),
                    });
                }
            }
        }

        let failed = reports.iter().filter(|r| !r.succeeded()).count();
        let lockboxes = self
            .created
            .iter()
            .filter_map(|id| self.vault.full_lockbox(*id).ok())
            .collect();
        let burned = self
            .created
            .iter()
            .copied()
            .filter(|id| self.vault.status(*id) == LockboxStatus::Burned)
            .collect();

        SimulationReport {
            steps: reports,
            failed,
            lockboxes,
            burned,
        }
    }

    fn apply(&mut self, index: usize, step: &Step) -> Result<StepResult> {
        let reference_id = reference_for(index);
        match step {
            Step::Approve {
                owner,
                token,
                spender,
                amount,
            } => {
                let spender = spender.unwrap_or(self.vault.address());
                self.chain.approve(*token, *owner, spender, *amount)?;
                Ok(StepResult::Done)
            }
            Step::ApproveCollection {
                owner,
                collection,
                operator,
            } => {
                let operator = operator.unwrap_or(self.vault.address());
                self.chain
                    .set_approval_for_all(*collection, *owner, operator, true)?;
                Ok(StepResult::Done)
            }
            Step::AdvanceTime { seconds } => {
                self.chain.advance(Duration::seconds(*seconds));
                Ok(StepResult::Clock {
                    now: self.chain.unix_time(),
                })
            }
            Step::SetDefaultMetadataUri { caller, uri } => {
                self.vault
                    .set_default_metadata_uri(CallContext::new(*caller), uri)?;
                Ok(StepResult::Done)
            }
            Step::Create { holder, key, batch } => {
                let authorization_key = self.key(key)?.address();
                let ctx = CallContext::new(*holder).with_value(batch.native_amount);
                let lockbox_id = self.vault.create_with_batch(
                    &mut self.chain,
                    ctx,
                    *holder,
                    authorization_key,
                    batch,
                    reference_id,
                )?;
                self.created.push(lockbox_id);
                Ok(StepResult::Created { lockbox_id })
            }
            Step::Deposit {
                holder,
                lockbox_id,
                batch,
            } => {
                let ctx = CallContext::new(*holder).with_value(batch.native_amount);
                self.vault
                    .batch_deposit(&mut self.chain, ctx, *lockbox_id, batch, reference_id)?;
                Ok(StepResult::Done)
            }
            Step::Execute {
                holder,
                lockbox_id,
                key,
                params,
            } => {
                let params = self.complete_route(params.clone())?;
                let request = SigningRequest {
                    lockbox_id: *lockbox_id,
                    nonce: self.vault.nonce(*lockbox_id)?,
                    caller: *holder,
                    reference_id,
                    expiry: self
                        .chain
                        .unix_time()
                        .checked_add(self.validity)
                        .context("expiry overflow")?,
                };
                let signed = sign_operation(self.key(key)?, self.vault.domain(), &request, &params)?;
                let result = self.dispatch(CallContext::new(*holder), *lockbox_id, &signed, &params)?;
                Ok(result)
            }
        }
    }

    fn key(&self, name: &str) -> Result<&AuthorizationKeypair> {
        self.keys
            .get(name)
            .ok_or_else(|| anyhow!("unknown key `{name}`"))
    }

    /// Fill empty swap call data for scenario routers.
    fn complete_route(&self, params: OperationParams) -> Result<OperationParams> {
        match params {
            OperationParams::Swap(mut request)
                if request.call_data.is_empty() && self.routers.contains(&request.router) =>
            {
                request.call_data = ConstantRateCall {
                    token_in: request.token_in,
                    token_out: request.token_out,
                    amount_in: request.amount_in,
                    pay_to: None,
                }
                .encode()?;
                Ok(OperationParams::Swap(request))
            }
            other => Ok(other),
        }
    }

    fn dispatch(
        &mut self,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        params: &OperationParams,
    ) -> Result<StepResult, VaultError> {
        let chain = &mut self.chain;
        let vault = &mut self.vault;
        match params {
            OperationParams::RotateKey { new_key } => {
                vault.rotate_key(chain, ctx, lockbox_id, signed, *new_key)?
            }
            OperationParams::WithdrawNative { amount, recipient } => {
                vault.withdraw_native(chain, ctx, lockbox_id, signed, *amount, *recipient)?
            }
            OperationParams::WithdrawToken {
                token,
                amount,
                recipient,
            } => vault.withdraw_token(chain, ctx, lockbox_id, signed, *token, *amount, *recipient)?,
            OperationParams::WithdrawItem {
                collection,
                item_id,
                recipient,
            } => vault.withdraw_item(chain, ctx, lockbox_id, signed, *collection, *item_id, *recipient)?,
            OperationParams::Burn => vault.burn(chain, ctx, lockbox_id, signed)?,
            OperationParams::SetMetadataUri { uri } => {
                vault.set_metadata_uri(chain, ctx, lockbox_id, signed, uri)?
            }
            OperationParams::BatchWithdraw(batch) => {
                vault.batch_withdraw(chain, ctx, lockbox_id, signed, batch)?
            }
            OperationParams::Swap(request) => {
                let outcome = vault.swap(chain, ctx, lockbox_id, signed, request)?;
                return Ok(StepResult::Swapped {
                    spent: outcome.spent,
                    received: outcome.received,
                });
            }
        }
        Ok(StepResult::Done)
    }
}

/// Deterministic correlation tag per step.
fn reference_for(index: usize) -> ReferenceId {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&(index as u64).to_be_bytes());
    ReferenceId::from_bytes(bytes)
}
