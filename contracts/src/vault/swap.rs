//! # Swap Engine
//!
//! Trades one asset held by a lockbox for another through a caller-chosen
//! router. The router is untrusted, so the engine never believes anything
//! it reports:
//!
//! 1. Debit `amount_in` from the ledger up front.
//! 2. Grant the router an allowance of exactly `amount_in` (or attach
//!    `amount_in` as native value).
//! 3. Call the router with the signed call data.
//! 4. Measure what left the vault. It must be exactly `amount_in`: more is
//!    an overspend, less is an underspend. Any leftover allowance is zeroed.
//! 5. Measure what arrived. Less than `min_amount_out` is slippage.
//! 6. Credit the output to the lockbox, or forward it to the external
//!    recipient.
//!
//! Any failure in between unwinds the whole call, router effects included.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lockbox_protocol::operation::{OperationParams, SignedOperation, SwapRequest};
use lockbox_protocol::types::{Amount, LockboxId, SwapAsset, SwapRecipient};

use super::errors::VaultError;
use super::{CallContext, LockboxVault};
use crate::chain::Chain;

/// Outcome of a committed swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    /// Input measured leaving the vault; always the signed `amount_in`.
    pub spent: Amount,
    /// Output measured at the vault.
    pub received: Amount,
}

impl LockboxVault {
    pub fn swap(
        &mut self,
        chain: &mut Chain,
        ctx: CallContext,
        lockbox_id: LockboxId,
        signed: &SignedOperation,
        request: &SwapRequest,
    ) -> Result<SwapOutcome, VaultError> {
        self.transact(chain, "swap", |vault, chain| {
            Self::reject_value(&ctx)?;
            vault.check_swap(request)?;
            if !chain.is_router(&request.router) {
                return Err(VaultError::SwapCallFailed(format!(
                    "no router deployed at {}",
                    request.router
                )));
            }
            vault.authorize(
                chain,
                &ctx,
                lockbox_id,
                signed,
                &OperationParams::Swap(request.clone()),
            )?;

            let outcome = vault.execute_swap(chain, lockbox_id, request)?;

            info!(
                lockbox_id,
                token_in = %request.token_in.wire_address(),
                token_out = %request.token_out.wire_address(),
                spent = %outcome.spent,
                received = %outcome.received,
                router = %request.router,
                reference_id = %signed.reference_id,
                "swap executed"
            );
            Ok(outcome)
        })
    }

    fn check_swap(&self, request: &SwapRequest) -> Result<(), VaultError> {
        if request.token_in == request.token_out {
            return Err(VaultError::SameTokenSwap);
        }
        for asset in [request.token_in, request.token_out] {
            if matches!(asset, SwapAsset::Token(address) if address.is_zero()) {
                return Err(VaultError::ZeroAddress);
            }
        }
        if request.amount_in == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if request.router.is_zero() {
            return Err(VaultError::ZeroAddress);
        }
        if let SwapRecipient::External(recipient) = request.recipient {
            self.check_recipient(recipient)?;
        }
        Ok(())
    }

    fn execute_swap(
        &mut self,
        chain: &mut Chain,
        lockbox_id: LockboxId,
        request: &SwapRequest,
    ) -> Result<SwapOutcome, VaultError> {
        let amount_in = request.amount_in;
        self.debit_asset(lockbox_id, request.token_in, amount_in)?;

        let in_before = self.holdings_of(chain, request.token_in)?;
        let out_before = self.holdings_of(chain, request.token_out)?;

        let value = match request.token_in {
            SwapAsset::Native => amount_in,
            SwapAsset::Token(token) => {
                chain.approve(token, self.address, request.router, amount_in)?;
                0
            }
        };

        chain
            .call_router(request.router, self.address, value, &request.call_data)
            .map_err(|e| VaultError::SwapCallFailed(e.to_string()))?;

        let in_after = self.holdings_of(chain, request.token_in)?;
        let spent = in_before.saturating_sub(in_after);
        if spent > amount_in {
            return Err(VaultError::RouterOverspent {
                allowed: amount_in,
                spent,
            });
        }

        if let SwapAsset::Token(token) = request.token_in {
            let residual = chain.allowance(token, &self.address, &request.router)?;
            if residual > 0 {
                chain.approve(token, self.address, request.router, 0)?;
                debug!(lockbox_id, token = %token, residual = %residual, "router allowance reset");
            }
        }

        if spent < amount_in {
            return Err(VaultError::RouterUnderspent {
                expected: amount_in,
                spent,
            });
        }

        let out_after = self.holdings_of(chain, request.token_out)?;
        let received = out_after.saturating_sub(out_before);
        if received < request.min_amount_out {
            return Err(VaultError::SlippageExceeded {
                minimum: request.min_amount_out,
                received,
            });
        }

        match request.recipient {
            SwapRecipient::Lockbox => self.credit_asset(lockbox_id, request.token_out, received)?,
            SwapRecipient::External(recipient) => match request.token_out {
                SwapAsset::Native => chain.transfer_native(self.address, recipient, received)?,
                SwapAsset::Token(token) => {
                    chain.transfer_tokens(token, self.address, recipient, received)?
                }
            },
        }

        Ok(SwapOutcome { spent, received })
    }

    /// The vault's own on-chain balance of `asset`, across all lockboxes.
    fn holdings_of(&self, chain: &Chain, asset: SwapAsset) -> Result<Amount, VaultError> {
        match asset {
            SwapAsset::Native => Ok(chain.native_balance(&self.address)),
            SwapAsset::Token(token) => Ok(chain.token_balance(token, &self.address)?),
        }
    }

    fn debit_asset(
        &mut self,
        lockbox_id: LockboxId,
        asset: SwapAsset,
        amount: Amount,
    ) -> Result<(), VaultError> {
        let ledger = &mut self.lockbox_mut(lockbox_id)?.ledger;
        match asset {
            SwapAsset::Native => ledger.debit_native(amount),
            SwapAsset::Token(token) => ledger.debit_token(token, amount),
        }
    }

    fn credit_asset(
        &mut self,
        lockbox_id: LockboxId,
        asset: SwapAsset,
        amount: Amount,
    ) -> Result<(), VaultError> {
        let ledger = &mut self.lockbox_mut(lockbox_id)?.ledger;
        match asset {
            SwapAsset::Native => ledger.credit_native(amount),
            SwapAsset::Token(token) => ledger.credit_token(token, amount),
        }
    }
}
