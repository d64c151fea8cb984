//! Signed withdrawals.

use tracing::info;

use lockbox_protocol::operation::{BatchWithdrawal, OperationParams, SignedOperation};
use lockbox_protocol::types::{Address, Amount, ItemId, ItemKey, LockboxId};

use super::deposit::{check_parallel, check_unique_items, check_unique_tokens};
use super::errors::VaultError;
use super::{CallContext, LockboxVault};
use crate::chain::Chain;

impl LockboxVault {
    pub fn withdraw_native(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        amount: Amount,
        recipient: Address,
    ) -> Result<(), VaultError> {
        self.transact(chain, "withdraw_native", |vault, chain| {
            Self::reject_value(&ctx)?;
            vault.check_recipient(recipient)?;
            if amount == 0 {
                return Err(VaultError::ZeroAmount);
            }
            let params = OperationParams::WithdrawNative { amount, recipient };
            vault.authorize(chain, &ctx, lockbox_id, signed, &params)?;

            vault.send_native(chain, lockbox_id, amount, recipient)?;

            info!(lockbox_id, amount = %amount, recipient = %recipient, reference_id = %signed.reference_id, "native withdrawn");
            Ok(())
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn withdraw_token(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        token: Address,
        amount: Amount,
        recipient: Address,
    ) -> Result<(), VaultError> {
        self.transact(chain, "withdraw_token", |vault, chain| {
            Self::reject_value(&ctx)?;
            vault.check_recipient(recipient)?;
            if token.is_zero() {
                return Err(VaultError::ZeroAddress);
            }
            if amount == 0 {
                return Err(VaultError::ZeroAmount);
            }
            let params = OperationParams::WithdrawToken {
                token,
                amount,
                recipient,
            };
            vault.authorize(chain, &ctx, lockbox_id, signed, &params)?;

            vault.send_tokens(chain, lockbox_id, token, amount, recipient)?;

            info!(lockbox_id, token = %token, amount = %amount, recipient = %recipient, reference_id = %signed.reference_id, "token withdrawn");
            Ok(())
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn withdraw_item(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        collection: Address,
        item_id: ItemId,
        recipient: Address,
    ) -> Result<(), VaultError> {
        self.transact(chain, "withdraw_item", |vault, chain| {
            Self::reject_value(&ctx)?;
            vault.check_recipient(recipient)?;
            if collection.is_zero() {
                return Err(VaultError::ZeroAddress);
            }
            let params = OperationParams::WithdrawItem {
                collection,
                item_id,
                recipient,
            };
            vault.authorize(chain, &ctx, lockbox_id, signed, &params)?;

            let key = ItemKey::new(collection, item_id);
            vault.send_item(chain, lockbox_id, key, recipient)?;

            info!(lockbox_id, item = %key, recipient = %recipient, reference_id = %signed.reference_id, "item withdrawn");
            Ok(())
        })
    }

    /// Withdraws native, tokens and items to one recipient. Shape and
    /// duplicate checks run before authorization and before any transfer.
    pub fn batch_withdraw(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        batch: &BatchWithdrawal,
    ) -> Result<(), VaultError> {
        self.transact(chain, "batch_withdraw", |vault, chain| {
            Self::reject_value(&ctx)?;
            check_parallel("tokens/amounts", batch.tokens.len(), batch.amounts.len())?;
            check_parallel(
                "collections/item_ids",
                batch.collections.len(),
                batch.item_ids.len(),
            )?;
            check_unique_tokens(&batch.tokens)?;
            check_unique_items(&batch.collections, &batch.item_ids)?;
            vault.check_recipient(batch.recipient)?;
            if batch.native_amount == 0 && batch.tokens.is_empty() && batch.collections.is_empty() {
                return Err(VaultError::ZeroAmount);
            }
            if batch.tokens.iter().chain(&batch.collections).any(Address::is_zero) {
                return Err(VaultError::ZeroAddress);
            }
            if batch.amounts.contains(&0) {
                return Err(VaultError::ZeroAmount);
            }

            let params = OperationParams::BatchWithdraw(batch.clone());
            vault.authorize(chain, &ctx, lockbox_id, signed, &params)?;

            if batch.native_amount > 0 {
                vault.send_native(chain, lockbox_id, batch.native_amount, batch.recipient)?;
            }
            for (token, amount) in batch.tokens.iter().zip(&batch.amounts) {
                vault.send_tokens(chain, lockbox_id, *token, *amount, batch.recipient)?;
            }
            for (collection, item_id) in batch.collections.iter().zip(&batch.item_ids) {
                vault.send_item(chain, lockbox_id, ItemKey::new(*collection, *item_id), batch.recipient)?;
            }

            info!(
                lockbox_id,
                native = %batch.native_amount,
                tokens = batch.tokens.len(),
                items = batch.item_ids.len(),
                recipient = %batch.recipient,
                reference_id = %signed.reference_id,
                "batch withdrawn"
            );
            Ok(())
        })
    }

    // -- Outbound transfer paths --------------------------------------------

    fn send_native(
        &mut self,
        chain: &mut Chain,
        lockbox_id: LockboxId,
        amount: Amount,
        recipient: Address,
    ) -> Result<(), VaultError> {
        self.lockbox_mut(lockbox_id)?.ledger.debit_native(amount)?;
        chain.transfer_native(self.address, recipient, amount)?;
        Ok(())
    }

    fn send_tokens(
        &mut self,
        chain: &mut Chain,
        lockbox_id: LockboxId,
        token: Address,
        amount: Amount,
        recipient: Address,
    ) -> Result<(), VaultError> {
        self.lockbox_mut(lockbox_id)?
            .ledger
            .debit_token(token, amount)?;
        chain.transfer_tokens(token, self.address, recipient, amount)?;
        Ok(())
    }

    fn send_item(
        &mut self,
        chain: &mut Chain,
        lockbox_id: LockboxId,
        key: ItemKey,
        recipient: Address,
    ) -> Result<(), VaultError> {
        self.lockbox_mut(lockbox_id)?.ledger.remove_item(&key)?;
        chain.transfer_item_from(key.collection, self.address, self.address, recipient, key.item_id)?;
        Ok(())
    }
}
