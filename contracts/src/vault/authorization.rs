//! # Operation Authorization
//!
//! Every outflow passes two independent checks:
//!
//! 1. **Holder**: the caller holds the lockbox.
//! 2. **Signature**: the submitted [`SignedOperation`] was produced by the
//!    lockbox's authorization key, for exactly these parameters, this
//!    caller, this lockbox, this deployment, and the *current* nonce.
//!
//! The vault never trusts the struct hash it is handed. It rebuilds the
//! operation from its own nonce and the plain parameters and compares
//! before doing any curve maths. Then it recovers the signer over the
//! domain-separated digest. Success consumes the nonce, so a signature is
//! good for exactly one call.
//!
//! The order is fixed on purpose: holder, expiry, nonce, struct hash,
//! signer. Every check must pass, so the order only picks which error a
//! call failing several of them reports.

use tracing::debug;

use lockbox_protocol::crypto::recover_signer;
use lockbox_protocol::operation::{
    build_operation, Domain, OperationParams, SignedOperation, SigningRequest,
};
use lockbox_protocol::types::{Address, LockboxId};

use super::errors::VaultError;
use super::{CallContext, LockboxVault};
use crate::chain::Chain;

/// The vault's side of an operation check.
#[derive(Clone, Copy, Debug)]
pub struct Verification<'a> {
    pub domain: &'a Domain,
    pub lockbox_id: LockboxId,
    pub authorization_key: Address,
    pub current_nonce: u64,
    pub caller: Address,
    /// Chain time, unix seconds.
    pub now: u64,
}

impl Verification<'_> {
    /// Checks `signed` against `params`. Order: expiry, nonce, struct hash,
    /// signer.
    pub fn check(
        &self,
        signed: &SignedOperation,
        params: &OperationParams,
    ) -> Result<(), VaultError> {
        if signed.is_expired_at(self.now) {
            return Err(VaultError::SignatureExpired {
                expiry: signed.expiry,
                now: self.now,
            });
        }

        if signed.nonce != self.current_nonce {
            return Err(VaultError::StaleNonce {
                expected: self.current_nonce,
                provided: signed.nonce,
            });
        }

        let rebuilt = build_operation(
            &SigningRequest {
                lockbox_id: self.lockbox_id,
                nonce: self.current_nonce,
                caller: self.caller,
                reference_id: signed.reference_id,
                expiry: signed.expiry,
            },
            params,
        );
        if rebuilt.struct_hash() != signed.struct_hash {
            return Err(VaultError::StructHashMismatch);
        }

        let digest = self.domain.digest(&signed.struct_hash);
        let signer =
            recover_signer(&digest, &signed.signature).map_err(|_| VaultError::InvalidSignature)?;
        if signer != self.authorization_key {
            return Err(VaultError::InvalidSignature);
        }
        Ok(())
    }
}

impl LockboxVault {
    /// Holder check, then signature check, then consume the nonce.
    pub(crate) fn authorize(
        &mut self,
        chain: &Chain,
        ctx: &CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        params: &OperationParams,
    ) -> Result<(), VaultError> {
        self.require_holder(lockbox_id, ctx.caller)?;

        let lockbox = self
            .state
            .lockboxes
            .get_mut(&lockbox_id)
            .ok_or(VaultError::NonexistentLockbox(lockbox_id))?;

        Verification {
            domain: &self.domain,
            lockbox_id,
            authorization_key: lockbox.authorization_key,
            current_nonce: lockbox.nonce,
            caller: ctx.caller,
            now: chain.unix_time(),
        }
        .check(signed, params)?;

        lockbox.nonce = lockbox
            .nonce
            .checked_add(1)
            .ok_or(VaultError::AmountOverflow)?;

        debug!(
            lockbox_id,
            operation = %params.operation_type(),
            next_nonce = lockbox.nonce,
            "operation authorized"
        );
        Ok(())
    }
}
