//! Lockbox creation.
//!
//! A lockbox is always minted to its caller and funded in the same call.
//! Each entry point validates, mints, then runs the ordinary deposit path,
//! so creation-time funding gets the same balance-delta accounting as a
//! later deposit.

use tracing::info;

use lockbox_protocol::types::{Address, Amount, ItemId, ItemKey, LockboxId, ReferenceId};

use super::deposit::AssetBatch;
use super::errors::VaultError;
use super::{CallContext, LockboxVault};
use crate::chain::Chain;

impl LockboxVault {
    fn check_creation(ctx: &CallContext, holder: Address, authorization_key: Address) -> Result<(), VaultError> {
        if holder.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        if holder != ctx.caller {
            return Err(VaultError::SelfMintOnly);
        }
        if authorization_key.is_zero() {
            return Err(VaultError::ZeroKey);
        }
        Ok(())
    }

    /// Creates a lockbox funded with the attached native value.
    pub fn create_with_native(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        holder: Address,
        authorization_key: Address,
        reference_id: ReferenceId,
    ) -> Result<LockboxId, VaultError> {
        self.transact(chain, "create_with_native", |vault, chain| {
            Self::check_creation(&ctx, holder, authorization_key)?;
            if ctx.value == 0 {
                return Err(VaultError::ZeroAmount);
            }

            let lockbox_id = vault.mint_lockbox(holder, authorization_key, chain.now())?;
            vault.receive_value(chain, &ctx)?;
            vault.lockbox_mut(lockbox_id)?.ledger.credit_native(ctx.value)?;

            info!(lockbox_id, holder = %holder, native = %ctx.value, reference_id = %reference_id, "lockbox created");
            Ok(lockbox_id)
        })
    }

    /// Creates a lockbox funded with one token.
    #[allow(clippy::too_many_arguments)]
    pub fn create_with_token(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        holder: Address,
        authorization_key: Address,
        token: Address,
        amount: Amount,
        reference_id: ReferenceId,
    ) -> Result<LockboxId, VaultError> {
        self.transact(chain, "create_with_token", |vault, chain| {
            Self::reject_value(&ctx)?;
            Self::check_creation(&ctx, holder, authorization_key)?;
            if token.is_zero() {
                return Err(VaultError::ZeroAddress);
            }
            if amount == 0 {
                return Err(VaultError::ZeroAmount);
            }

            let lockbox_id = vault.mint_lockbox(holder, authorization_key, chain.now())?;
            let received = vault.pull_tokens(chain, lockbox_id, holder, token, amount)?;

            info!(lockbox_id, holder = %holder, token = %token, received = %received, reference_id = %reference_id, "lockbox created");
            Ok(lockbox_id)
        })
    }

    /// Creates a lockbox holding one item.
    #[allow(clippy::too_many_arguments)]
    pub fn create_with_item(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        holder: Address,
        authorization_key: Address,
        collection: Address,
        item_id: ItemId,
        reference_id: ReferenceId,
    ) -> Result<LockboxId, VaultError> {
        self.transact(chain, "create_with_item", |vault, chain| {
            Self::reject_value(&ctx)?;
            Self::check_creation(&ctx, holder, authorization_key)?;
            if collection.is_zero() {
                return Err(VaultError::ZeroAddress);
            }

            let key = ItemKey::new(collection, item_id);
            let lockbox_id = vault.mint_lockbox(holder, authorization_key, chain.now())?;
            vault.pull_item(chain, lockbox_id, holder, key)?;

            info!(lockbox_id, holder = %holder, item = %key, reference_id = %reference_id, "lockbox created");
            Ok(lockbox_id)
        })
    }

    /// Creates a lockbox funded with a whole batch. The native part arrives
    /// as attached value and must equal `batch.native_amount`.
    pub fn create_with_batch(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        holder: Address,
        authorization_key: Address,
        batch: &AssetBatch,
        reference_id: ReferenceId,
    ) -> Result<LockboxId, VaultError> {
        self.transact(chain, "create_with_batch", |vault, chain| {
            Self::check_creation(&ctx, holder, authorization_key)?;
            batch.validate(ctx.value)?;

            let lockbox_id = vault.mint_lockbox(holder, authorization_key, chain.now())?;
            vault.fund(chain, &ctx, lockbox_id, batch)?;

            info!(
                lockbox_id,
                holder = %holder,
                native = %batch.native_amount,
                tokens = batch.tokens.len(),
                items = batch.item_ids.len(),
                reference_id = %reference_id,
                "lockbox created"
            );
            Ok(lockbox_id)
        })
    }
}
