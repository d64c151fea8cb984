//! Deposits.
//!
//! Deposits need no signature, only the holder. Token deposits credit what
//! the vault's balance actually grew by, not what the caller asked to send,
//! so a fee-on-transfer token can never make the ledger claim more than the
//! vault holds.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lockbox_protocol::types::{Address, Amount, ItemId, ItemKey, LockboxId, ReferenceId};

use super::errors::VaultError;
use super::{CallContext, LockboxVault};
use crate::chain::Chain;

/// A bundle of assets to move in one call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBatch {
    #[serde(default)]
    pub native_amount: Amount,
    #[serde(default)]
    pub tokens: Vec<Address>,
    #[serde(default)]
    pub amounts: Vec<Amount>,
    #[serde(default)]
    pub collections: Vec<Address>,
    #[serde(default)]
    pub item_ids: Vec<ItemId>,
}

impl AssetBatch {
    pub fn is_empty(&self) -> bool {
        self.native_amount == 0 && self.tokens.is_empty() && self.collections.is_empty()
    }

    /// Shape checks shared by creation and deposit. Runs before any
    /// transfer.
    pub(crate) fn validate(&self, attached_value: Amount) -> Result<(), VaultError> {
        check_parallel(
            "tokens/amounts",
            self.tokens.len(),
            self.amounts.len(),
        )?;
        check_parallel(
            "collections/item_ids",
            self.collections.len(),
            self.item_ids.len(),
        )?;
        if self.is_empty() {
            return Err(VaultError::ZeroAmount);
        }
        if self.native_amount != attached_value {
            return Err(VaultError::NativeAmountMismatch {
                declared: self.native_amount,
                sent: attached_value,
            });
        }
        check_unique_tokens(&self.tokens)?;
        check_unique_items(&self.collections, &self.item_ids)?;
        Ok(())
    }
}

pub(crate) fn check_parallel(what: &'static str, left: usize, right: usize) -> Result<(), VaultError> {
    if left != right {
        return Err(VaultError::LengthMismatch { what, left, right });
    }
    Ok(())
}

pub(crate) fn check_unique_tokens(tokens: &[Address]) -> Result<(), VaultError> {
    let mut seen = HashSet::with_capacity(tokens.len());
    for token in tokens {
        if !seen.insert(token) {
            return Err(VaultError::DuplicateEntry(format!("token {token}")));
        }
    }
    Ok(())
}

pub(crate) fn check_unique_items(collections: &[Address], item_ids: &[ItemId]) -> Result<(), VaultError> {
    let mut seen = HashSet::with_capacity(collections.len());
    for key in collections
        .iter()
        .zip(item_ids)
        .map(|(collection, item_id)| ItemKey::new(*collection, *item_id))
    {
        if !seen.insert(key) {
            return Err(VaultError::DuplicateEntry(format!("item {key}")));
        }
    }
    Ok(())
}

impl LockboxVault {
    // -- Public entry points ------------------------------------------------

    pub fn deposit_native(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        reference_id: ReferenceId,
    ) -> Result<(), VaultError> {
        self.transact(chain, "deposit_native", |vault, chain| {
            vault.require_holder(lockbox_id, ctx.caller)?;
            if ctx.value == 0 {
                return Err(VaultError::ZeroAmount);
            }
            vault.receive_value(chain, &ctx)?;
            vault.lockbox_mut(lockbox_id)?.ledger.credit_native(ctx.value)?;

            info!(lockbox_id, amount = %ctx.value, reference_id = %reference_id, "native deposited");
            Ok(())
        })
    }

    /// Pulls `amount` of `token` from the caller (who must have approved
    /// the vault) and credits what actually arrived.
    pub fn deposit_token(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        token: Address,
        amount: Amount,
        reference_id: ReferenceId,
    ) -> Result<Amount, VaultError> {
        self.transact(chain, "deposit_token", |vault, chain| {
            Self::reject_value(&ctx)?;
            vault.require_holder(lockbox_id, ctx.caller)?;
            let received = vault.pull_tokens(chain, lockbox_id, ctx.caller, token, amount)?;

            info!(lockbox_id, token = %token, received = %received, reference_id = %reference_id, "token deposited");
            Ok(received)
        })
    }

    /// Pulls one item from the caller (who must have approved the vault as
    /// operator).
    pub fn deposit_item(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        collection: Address,
        item_id: ItemId,
        reference_id: ReferenceId,
    ) -> Result<(), VaultError> {
        self.transact(chain, "deposit_item", |vault, chain| {
            Self::reject_value(&ctx)?;
            vault.require_holder(lockbox_id, ctx.caller)?;
            let key = ItemKey::new(collection, item_id);
            vault.pull_item(chain, lockbox_id, ctx.caller, key)?;

            info!(lockbox_id, item = %key, reference_id = %reference_id, "item deposited");
            Ok(())
        })
    }

    /// Native (as attached value), tokens and items in one call.
    pub fn batch_deposit(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        batch: &AssetBatch,
        reference_id: ReferenceId,
    ) -> Result<(), VaultError> {
        self.transact(chain, "batch_deposit", |vault, chain| {
            vault.require_holder(lockbox_id, ctx.caller)?;
            batch.validate(ctx.value)?;
            vault.fund(chain, &ctx, lockbox_id, batch)?;

            info!(
                lockbox_id,
                native = %batch.native_amount,
                tokens = batch.tokens.len(),
                items = batch.item_ids.len(),
                reference_id = %reference_id,
                "batch deposited"
            );
            Ok(())
        })
    }

    // -- Shared deposit paths -----------------------------------------------

    /// Moves a validated batch into `lockbox_id`.
    pub(crate) fn fund(
        &mut self,
        chain: &mut Chain,
        ctx: &CallContext,
        lockbox_id: LockboxId,
        batch: &AssetBatch,
    ) -> Result<(), VaultError> {
        if batch.native_amount > 0 {
            self.receive_value(chain, ctx)?;
            self.lockbox_mut(lockbox_id)?
                .ledger
                .credit_native(batch.native_amount)?;
        }
        for (token, amount) in batch.tokens.iter().zip(&batch.amounts) {
            self.pull_tokens(chain, lockbox_id, ctx.caller, *token, *amount)?;
        }
        for (collection, item_id) in batch.collections.iter().zip(&batch.item_ids) {
            self.pull_item(chain, lockbox_id, ctx.caller, ItemKey::new(*collection, *item_id))?;
        }
        Ok(())
    }

    /// Balance-delta token deposit. Returns the amount credited.
    pub(crate) fn pull_tokens(
        &mut self,
        chain: &mut Chain,
        lockbox_id: LockboxId,
        from: Address,
        token: Address,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        if token.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }

        let before = chain.token_balance(token, &self.address)?;
        chain.transfer_tokens_from(token, self.address, from, self.address, amount)?;
        let after = chain.token_balance(token, &self.address)?;

        let received = after.saturating_sub(before);
        if received == 0 {
            return Err(VaultError::ZeroAmount);
        }
        self.lockbox_mut(lockbox_id)?
            .ledger
            .credit_token(token, received)?;

        debug!(lockbox_id, token = %token, requested = %amount, received = %received, "tokens pulled");
        Ok(received)
    }

    /// Item deposit. Verifies the vault really owns the item afterwards.
    pub(crate) fn pull_item(
        &mut self,
        chain: &mut Chain,
        lockbox_id: LockboxId,
        from: Address,
        key: ItemKey,
    ) -> Result<(), VaultError> {
        if key.collection.is_zero() {
            return Err(VaultError::ZeroAddress);
        }

        chain.transfer_item_from(key.collection, self.address, from, self.address, key.item_id)?;
        if chain.item_owner(key.collection, key.item_id)? != Some(self.address) {
            return Err(VaultError::ItemNotReceived(key));
        }
        self.lockbox_mut(lockbox_id)?.ledger.insert_item(key)?;

        debug!(lockbox_id, item = %key, "item pulled");
        Ok(())
    }
}
