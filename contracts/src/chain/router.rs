//! # Swap Routers
//!
//! A router is external code the vault calls with an opaque payload. The
//! vault grants it an exact allowance (or attaches native value), calls it,
//! and then measures what actually moved. Nothing a router *says* is
//! trusted; the return value is ignored.
//!
//! Routers receive the host chain mutably so they can pull, mint and pay,
//! but they never receive the vault. There is no path from router code back
//! into a vault entry point.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lockbox_protocol::types::{Address, Amount, SwapAsset};

use super::{Chain, ChainError};

/// Failure inside router code. The vault reports all of these as a failed
/// swap call.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The router rejected the call on its own terms.
    #[error("router reverted: {0}")]
    Reverted(String),

    /// The call payload could not be decoded.
    #[error("malformed call data: {0}")]
    MalformedCall(String),

    /// A token, collection or native transfer inside the router failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Everything a router learns about the call.
#[derive(Clone, Copy, Debug)]
pub struct RouterCall<'a> {
    /// The router's own address; where it holds inventory.
    pub router: Address,
    /// Who called it (the vault, for swaps).
    pub caller: Address,
    /// Native value attached to the call, already credited to `router`.
    pub value: Amount,
    pub call_data: &'a [u8],
}

/// External swap code.
pub trait Router: Send + Sync + fmt::Debug {
    fn execute(&self, chain: &mut Chain, call: RouterCall<'_>) -> Result<Vec<u8>, RouterError>;
}

// ---------------------------------------------------------------------------
// Constant-rate reference router
// ---------------------------------------------------------------------------

/// Call payload understood by [`ConstantRateRouter`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantRateCall {
    pub token_in: SwapAsset,
    pub token_out: SwapAsset,
    pub amount_in: Amount,
    /// Output destination; the caller when absent.
    #[serde(default)]
    pub pay_to: Option<Address>,
}

impl ConstantRateCall {
    pub fn encode(&self) -> Result<Vec<u8>, RouterError> {
        serde_json::to_vec(self).map_err(|e| RouterError::MalformedCall(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, RouterError> {
        serde_json::from_slice(bytes).map_err(|e| RouterError::MalformedCall(e.to_string()))
    }
}

/// Swaps any pair at `numerator / denominator`, paying out of its own
/// inventory. Pulls exactly `amount_in` of a token input via the caller's
/// allowance; native input must arrive as call value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantRateRouter {
    pub numerator: Amount,
    pub denominator: Amount,
}

impl ConstantRateRouter {
    pub fn new(numerator: Amount, denominator: Amount) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn quote(&self, amount_in: Amount) -> Result<Amount, RouterError> {
        if self.denominator == 0 {
            return Err(RouterError::Reverted("zero rate denominator".into()));
        }
        amount_in
            .checked_mul(self.numerator)
            .map(|scaled| scaled / self.denominator)
            .ok_or_else(|| RouterError::Reverted("quote overflow".into()))
    }
}

impl Router for ConstantRateRouter {
    fn execute(&self, chain: &mut Chain, call: RouterCall<'_>) -> Result<Vec<u8>, RouterError> {
        let request = ConstantRateCall::decode(call.call_data)?;
        if request.token_in == request.token_out {
            return Err(RouterError::Reverted("identical assets".into()));
        }

        match request.token_in {
            SwapAsset::Native => {
                if call.value != request.amount_in {
                    return Err(RouterError::Reverted(format!(
                        "expected {} native, got {}",
                        request.amount_in, call.value
                    )));
                }
            }
            SwapAsset::Token(token) => {
                chain.transfer_tokens_from(
                    token,
                    call.router,
                    call.caller,
                    call.router,
                    request.amount_in,
                )?;
            }
        }

        let amount_out = self.quote(request.amount_in)?;
        let pay_to = request.pay_to.unwrap_or(call.caller);
        match request.token_out {
            SwapAsset::Native => chain.transfer_native(call.router, pay_to, amount_out)?,
            SwapAsset::Token(token) => {
                chain.transfer_tokens(token, call.router, pay_to, amount_out)?
            }
        }

        Ok(amount_out.to_be_bytes().to_vec())
    }
}
