//! Fungible token contracts.
//!
//! Balances, allowances, and a [`TokenBehavior`] knob for the real-world
//! tokens that don't behave like the textbook: fee-on-transfer tokens, and
//! broken ones that never check allowances. The vault has to be correct
//! against all of them, so the host models all of them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lockbox_protocol::config::BPS_DENOMINATOR;
use lockbox_protocol::types::{Address, Amount};

use super::ChainError;

/// How a token contract treats transfers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenBehavior {
    /// Moves exactly the requested amount.
    #[default]
    Standard,
    /// Burns `fee_bps` of every transfer; the recipient gets the rest.
    FeeOnTransfer { fee_bps: u16 },
    /// Non-conformant: `transfer_from` ignores allowances entirely.
    AllowanceUnchecked,
}

/// State of one fungible token contract.
#[derive(Clone, Debug, Default)]
pub struct FungibleToken {
    pub symbol: String,
    pub behavior: TokenBehavior,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    /// `(owner, spender) -> remaining allowance`.
    allowances: HashMap<(Address, Address), Amount>,
}

impl FungibleToken {
    pub fn new(symbol: impl Into<String>, behavior: TokenBehavior) -> Self {
        Self {
            symbol: symbol.into(),
            behavior,
            ..Self::default()
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn mint(&mut self, to: Address, amount: Amount) -> Result<(), ChainError> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(ChainError::Overflow)?;
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(ChainError::Overflow)?;
        Ok(())
    }

    /// Sets (overwrites) an allowance, like `approve`.
    pub(crate) fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// The fee charged on a transfer of `amount`.
    pub fn fee_for(&self, amount: Amount) -> Amount {
        match self.behavior {
            TokenBehavior::FeeOnTransfer { fee_bps } => {
                amount.saturating_mul(Amount::from(fee_bps)) / BPS_DENOMINATOR
            }
            _ => 0,
        }
    }

    pub(crate) fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        let available = self.balance_of(&from);
        if available < amount {
            return Err(ChainError::InsufficientTokenBalance {
                token,
                account: from,
                available,
                requested: amount,
            });
        }

        let fee = self.fee_for(amount);
        let delivered = amount - fee;

        self.balances.insert(from, available - amount);
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(delivered).ok_or(ChainError::Overflow)?;
        self.total_supply -= fee;
        Ok(())
    }

    pub(crate) fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        if self.behavior != TokenBehavior::AllowanceUnchecked && spender != from {
            let allowance = self.allowance(&from, &spender);
            if allowance < amount {
                return Err(ChainError::InsufficientAllowance {
                    token,
                    owner: from,
                    spender,
                    allowance,
                    requested: amount,
                });
            }
            self.approve(from, spender, allowance - amount);
        }
        self.transfer(token, from, to, amount)
    }
}
