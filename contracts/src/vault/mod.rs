//! # Lockbox Vault Contract
//!
//! A lockbox is a non-transferable vault token. Its holder can deposit
//! freely, but every outflow (withdrawal, swap, key rotation, metadata
//! change, burn) needs a fresh operation signed by the lockbox's
//! *authorization key*, a separate secp256k1 key the holder delegated at
//! creation. Stealing the holder's account is not enough to drain a lockbox.
//!
//! ## Structure
//!
//! - [`ledger`]: per-lockbox balances and enumeration arrays.
//! - [`authorization`]: the holder + signature + nonce gate.
//! - `create`, `deposit`, `withdraw`, `swap`, `lifecycle`: entry points,
//!   each an `impl LockboxVault` block.
//!
//! ## Atomicity
//!
//! Every state-changing entry point runs inside [`LockboxVault::transact`],
//! which snapshots the vault state *and* the host chain and restores both on
//! error. A call either commits everything it did or nothing.
//!
//! ## Reentrancy
//!
//! External code (token contracts, routers) only ever receives `&mut Chain`.
//! The vault is borrowed mutably for the whole entry point, so the borrow
//! checker rules out a nested call into the vault.

pub mod authorization;
mod create;
mod deposit;
pub mod errors;
mod lifecycle;
pub mod ledger;
mod swap;
mod withdraw;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lockbox_protocol::operation::Domain;
use lockbox_protocol::types::{Address, Amount, ItemKey, LockboxId};

use crate::chain::Chain;

pub use authorization::Verification;
pub use deposit::AssetBatch;
pub use errors::{ErrorClass, VaultError};
pub use ledger::{AssetLedger, DenseIndex, TokenEntry};
pub use swap::SwapOutcome;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Who is calling, and with how much native value attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: Amount,
}

impl CallContext {
    pub fn new(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Lifecycle of a lockbox id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockboxStatus {
    /// The id has not been minted yet.
    Uncreated,
    Active,
    /// Burned. Ids are never reused, so this is terminal.
    Burned,
}

/// Read-only view of one lockbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockboxSnapshot {
    pub lockbox_id: LockboxId,
    pub holder: Address,
    pub nonce: u64,
    pub native_balance: Amount,
    pub tokens: Vec<TokenEntry>,
    pub items: Vec<ItemKey>,
    pub created_at: DateTime<Utc>,
}

/// Per-lockbox record.
#[derive(Clone, Debug)]
pub(crate) struct Lockbox {
    pub(crate) authorization_key: Address,
    /// Next nonce an operation must be signed against.
    pub(crate) nonce: u64,
    pub(crate) ledger: AssetLedger,
    pub(crate) metadata_uri: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

impl Lockbox {
    /// Nonces start at 1.
    pub(crate) const INITIAL_NONCE: u64 = 1;

    fn new(authorization_key: Address, created_at: DateTime<Utc>) -> Self {
        Self {
            authorization_key,
            nonce: Self::INITIAL_NONCE,
            ledger: AssetLedger::default(),
            metadata_uri: None,
            created_at,
        }
    }
}

/// Everything the vault persists. Cloned wholesale for rollback.
#[derive(Clone, Debug, Default)]
pub(crate) struct VaultState {
    pub(crate) next_id: LockboxId,
    pub(crate) owners: HashMap<LockboxId, Address>,
    pub(crate) holdings: HashMap<Address, u64>,
    pub(crate) lockboxes: HashMap<LockboxId, Lockbox>,
    pub(crate) default_metadata_uri: Option<String>,
}

// ---------------------------------------------------------------------------
// LockboxVault
// ---------------------------------------------------------------------------

/// The vault contract.
#[derive(Clone, Debug)]
pub struct LockboxVault {
    address: Address,
    admin: Address,
    domain: Domain,
    pub(crate) state: VaultState,
}

impl LockboxVault {
    /// Deploy a vault at `address` on chain `chain_id`.
    pub fn new(address: Address, admin: Address, chain_id: u64) -> Self {
        Self {
            address,
            admin,
            domain: Domain::new(chain_id, address),
            state: VaultState::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// The typed-data domain operations must be signed under.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Run `body` atomically: on error both the vault and the chain are
    /// restored to their state before the call.
    pub(crate) fn transact<T>(
        &mut self,
        chain: &mut Chain,
        operation: &'static str,
        body: impl FnOnce(&mut Self, &mut Chain) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let vault_before = self.state.clone();
        let chain_before = chain.clone();

        match body(self, chain) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(operation, error = %err, class = ?err.class(), "call reverted");
                self.state = vault_before;
                *chain = chain_before;
                Err(err)
            }
        }
    }

    // -- Internal helpers ---------------------------------------------------

    pub(crate) fn lockbox(&self, lockbox_id: LockboxId) -> Result<&Lockbox, VaultError> {
        self.state
            .lockboxes
            .get(&lockbox_id)
            .ok_or(VaultError::NonexistentLockbox(lockbox_id))
    }

    pub(crate) fn lockbox_mut(&mut self, lockbox_id: LockboxId) -> Result<&mut Lockbox, VaultError> {
        self.state
            .lockboxes
            .get_mut(&lockbox_id)
            .ok_or(VaultError::NonexistentLockbox(lockbox_id))
    }

    pub(crate) fn require_holder(
        &self,
        lockbox_id: LockboxId,
        caller: Address,
    ) -> Result<(), VaultError> {
        let holder = self.owner_of(lockbox_id)?;
        if holder != caller {
            return Err(VaultError::NotHolder { lockbox_id, caller });
        }
        Ok(())
    }

    pub(crate) fn reject_value(ctx: &CallContext) -> Result<(), VaultError> {
        if ctx.value != 0 {
            return Err(VaultError::UnexpectedValue(ctx.value));
        }
        Ok(())
    }

    /// Moves the call's attached value from the caller into the vault.
    pub(crate) fn receive_value(&self, chain: &mut Chain, ctx: &CallContext) -> Result<(), VaultError> {
        if ctx.value > 0 {
            chain.transfer_native(ctx.caller, self.address, ctx.value)?;
        }
        Ok(())
    }

    /// Recipients must be real accounts other than the vault.
    pub(crate) fn check_recipient(&self, recipient: Address) -> Result<(), VaultError> {
        if recipient.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        if recipient == self.address {
            return Err(VaultError::InvalidRecipient(recipient));
        }
        Ok(())
    }

    pub(crate) fn mint_lockbox(
        &mut self,
        holder: Address,
        authorization_key: Address,
        now: DateTime<Utc>,
    ) -> Result<LockboxId, VaultError> {
        let lockbox_id = self.state.next_id;
        self.state.next_id = lockbox_id
            .checked_add(1)
            .ok_or(VaultError::AmountOverflow)?;
        self.state.owners.insert(lockbox_id, holder);
        *self.state.holdings.entry(holder).or_insert(0) += 1;
        self.state
            .lockboxes
            .insert(lockbox_id, Lockbox::new(authorization_key, now));
        Ok(lockbox_id)
    }

    // -- Views --------------------------------------------------------------

    pub fn owner_of(&self, lockbox_id: LockboxId) -> Result<Address, VaultError> {
        self.state
            .owners
            .get(&lockbox_id)
            .copied()
            .ok_or(VaultError::NonexistentLockbox(lockbox_id))
    }

    /// Number of lockboxes held by `holder`.
    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.state.holdings.get(holder).copied().unwrap_or(0)
    }

    pub fn status(&self, lockbox_id: LockboxId) -> LockboxStatus {
        if self.state.owners.contains_key(&lockbox_id) {
            LockboxStatus::Active
        } else if lockbox_id < self.state.next_id {
            LockboxStatus::Burned
        } else {
            LockboxStatus::Uncreated
        }
    }

    /// Soulbound marker: every existing lockbox is locked.
    pub fn locked(&self, lockbox_id: LockboxId) -> Result<bool, VaultError> {
        self.owner_of(lockbox_id).map(|_| true)
    }

    /// Current nonce, the one the next operation must be signed against.
    pub fn nonce(&self, lockbox_id: LockboxId) -> Result<u64, VaultError> {
        self.lockbox(lockbox_id).map(|l| l.nonce)
    }

    pub fn authorization_key(&self, lockbox_id: LockboxId) -> Result<Address, VaultError> {
        self.lockbox(lockbox_id).map(|l| l.authorization_key)
    }

    pub fn native_balance(&self, lockbox_id: LockboxId) -> Result<Amount, VaultError> {
        self.lockbox(lockbox_id).map(|l| l.ledger.native_balance())
    }

    pub fn token_balance(&self, lockbox_id: LockboxId, token: &Address) -> Result<Amount, VaultError> {
        self.lockbox(lockbox_id).map(|l| l.ledger.token_balance(token))
    }

    pub fn full_lockbox(&self, lockbox_id: LockboxId) -> Result<LockboxSnapshot, VaultError> {
        let lockbox = self.lockbox(lockbox_id)?;
        Ok(LockboxSnapshot {
            lockbox_id,
            holder: self.owner_of(lockbox_id)?,
            nonce: lockbox.nonce,
            native_balance: lockbox.ledger.native_balance(),
            tokens: lockbox.ledger.token_entries(),
            items: lockbox.ledger.items().to_vec(),
            created_at: lockbox.created_at,
        })
    }
}
