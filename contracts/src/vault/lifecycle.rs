//! Key rotation, metadata, burn, and the soulbound token surface.

use tracing::info;

use lockbox_protocol::operation::{OperationParams, SignedOperation};
use lockbox_protocol::types::{Address, LockboxId};

use super::errors::VaultError;
use super::{CallContext, LockboxVault};
use crate::chain::Chain;

impl LockboxVault {
    /// Replaces the authorization key. The old key is dead immediately.
    pub fn rotate_key(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        new_key: Address,
    ) -> Result<(), VaultError> {
        self.transact(chain, "rotate_key", |vault, chain| {
            Self::reject_value(&ctx)?;
            if new_key.is_zero() {
                return Err(VaultError::ZeroKey);
            }
            vault.authorize(chain, &ctx, lockbox_id, signed, &OperationParams::RotateKey { new_key })?;
            vault.lockbox_mut(lockbox_id)?.authorization_key = new_key;

            info!(lockbox_id, new_key = %new_key, reference_id = %signed.reference_id, "authorization key rotated");
            Ok(())
        })
    }

    /// Sets the lockbox's own metadata URI. An empty URI clears it.
    pub fn set_metadata_uri(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        uri: &str,
    ) -> Result<(), VaultError> {
        self.transact(chain, "set_metadata_uri", |vault, chain| {
            Self::reject_value(&ctx)?;
            let params = OperationParams::SetMetadataUri {
                uri: uri.to_string(),
            };
            vault.authorize(chain, &ctx, lockbox_id, signed, &params)?;
            vault.lockbox_mut(lockbox_id)?.metadata_uri =
                (!uri.is_empty()).then(|| uri.to_string());

            info!(lockbox_id, uri, reference_id = %signed.reference_id, "metadata uri set");
            Ok(())
        })
    }

    /// Destroys an empty lockbox. The id is never reused.
    pub fn burn(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
    ) -> Result<(), VaultError> {
        self.transact(chain, "burn", |vault, chain| {
            Self::reject_value(&ctx)?;
            vault.authorize(chain, &ctx, lockbox_id, signed, &OperationParams::Burn)?;
            if !vault.lockbox(lockbox_id)?.ledger.is_empty() {
                return Err(VaultError::LedgerNotEmpty(lockbox_id));
            }

            vault.state.lockboxes.remove(&lockbox_id);
            if let Some(holder) = vault.state.owners.remove(&lockbox_id) {
                if let Some(count) = vault.state.holdings.get_mut(&holder) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        vault.state.holdings.remove(&holder);
                    }
                }
            }

            info!(lockbox_id, reference_id = %signed.reference_id, "lockbox burned");
            Ok(())
        })
    }

    /// Lockboxes cannot change hands, whoever asks.
    pub fn transfer_lockbox(
        &self,
        _ctx: CallContext,
        lockbox_id: LockboxId,
        _to: Address,
    ) -> Result<(), VaultError> {
        self.owner_of(lockbox_id)?;
        Err(VaultError::TransfersDisabled)
    }

    // -- Metadata -----------------------------------------------------------

    /// One-shot, admin-only base URI for lockboxes without their own.
    pub fn set_default_metadata_uri(&mut self, ctx: CallContext, uri: &str) -> Result<(), VaultError> {
        if ctx.caller != self.admin {
            return Err(VaultError::NotAdmin);
        }
        if self.state.default_metadata_uri.is_some() {
            return Err(VaultError::DefaultMetadataUriAlreadySet);
        }
        self.state.default_metadata_uri = Some(uri.to_string());
        info!(uri, "default metadata uri set");
        Ok(())
    }

    /// Custom URI if set, else the default base followed by the id.
    pub fn metadata_uri(&self, lockbox_id: LockboxId) -> Result<String, VaultError> {
        let lockbox = self.lockbox(lockbox_id)?;
        if let Some(uri) = &lockbox.metadata_uri {
            return Ok(uri.clone());
        }
        self.state
            .default_metadata_uri
            .as_ref()
            .map(|base| format!("{base}{lockbox_id}"))
            .ok_or(VaultError::MissingMetadataUri(lockbox_id))
    }
}
