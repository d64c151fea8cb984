//! # Per-Lockbox Asset Ledger
//!
//! Each lockbox tracks three kinds of holdings:
//!
//! - a native balance,
//! - a balance per fungible token, plus an enumeration array of the tokens
//!   it currently holds,
//! - an enumeration array of the (collection, id) items it holds.
//!
//! Both enumeration arrays are [`DenseIndex`]es: a `Vec` of keys and a map
//! from key to position. Removal swaps the last entry into the hole and
//! fixes up that entry's position, so insert, remove and membership are all
//! O(1) and the array never contains gaps.
//!
//! A token is in the array exactly when its balance is non-zero. The debit
//! path that takes a balance to zero deregisters the token in the same
//! step; the credit path registers it on the zero-to-positive transition.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use lockbox_protocol::types::{Address, Amount, ItemKey};

use super::errors::VaultError;

// ---------------------------------------------------------------------------
// DenseIndex
// ---------------------------------------------------------------------------

/// Gap-free enumeration array with O(1) swap-remove.
#[derive(Clone, Debug)]
pub struct DenseIndex<K> {
    entries: Vec<K>,
    positions: HashMap<K, usize>,
}

impl<K> Default for DenseIndex<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> DenseIndex<K> {
    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Appends `key`. Returns `false` and changes nothing if present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.positions.insert(key, self.entries.len());
        self.entries.push(key);
        true
    }

    /// Swap-removes `key`. Removing an absent key is a no-op returning
    /// `false`.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(position) = self.positions.remove(key) else {
            return false;
        };
        self.entries.swap_remove(position);
        if let Some(moved) = self.entries.get(position) {
            self.positions.insert(*moved, position);
        }
        true
    }

    pub fn as_slice(&self) -> &[K] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AssetLedger
// ---------------------------------------------------------------------------

/// One token line in a lockbox snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: Address,
    pub balance: Amount,
}

/// Holdings of a single lockbox.
#[derive(Clone, Debug, Default)]
pub struct AssetLedger {
    native: Amount,
    token_balances: HashMap<Address, Amount>,
    tokens: DenseIndex<Address>,
    items: DenseIndex<ItemKey>,
}

impl AssetLedger {
    pub fn native_balance(&self) -> Amount {
        self.native
    }

    pub fn token_balance(&self, token: &Address) -> Amount {
        self.token_balances.get(token).copied().unwrap_or(0)
    }

    /// Tokens with a non-zero balance, in enumeration order.
    pub fn tokens(&self) -> &[Address] {
        self.tokens.as_slice()
    }

    pub fn items(&self) -> &[ItemKey] {
        self.items.as_slice()
    }

    pub fn token_entries(&self) -> Vec<TokenEntry> {
        self.tokens
            .as_slice()
            .iter()
            .map(|token| TokenEntry {
                token: *token,
                balance: self.token_balance(token),
            })
            .collect()
    }

    /// True when the lockbox holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.native == 0 && self.tokens.is_empty() && self.items.is_empty()
    }

    pub fn credit_native(&mut self, amount: Amount) -> Result<(), VaultError> {
        self.native = self
            .native
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        Ok(())
    }

    pub fn debit_native(&mut self, amount: Amount) -> Result<(), VaultError> {
        if self.native < amount {
            return Err(VaultError::InsufficientNativeBalance {
                available: self.native,
                requested: amount,
            });
        }
        self.native -= amount;
        Ok(())
    }

    /// Adds `amount` of `token`, registering it on first credit.
    pub fn credit_token(&mut self, token: Address, amount: Amount) -> Result<(), VaultError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.token_balance(&token);
        let updated = balance
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        self.token_balances.insert(token, updated);
        self.tokens.insert(token);
        Ok(())
    }

    /// Subtracts `amount` of `token`, deregistering it when the balance
    /// reaches zero.
    pub fn debit_token(&mut self, token: Address, amount: Amount) -> Result<(), VaultError> {
        let balance = self.token_balance(&token);
        if balance < amount {
            return Err(VaultError::InsufficientTokenBalance {
                token,
                available: balance,
                requested: amount,
            });
        }
        let remaining = balance - amount;
        if remaining == 0 {
            self.token_balances.remove(&token);
            self.tokens.remove(&token);
        } else {
            self.token_balances.insert(token, remaining);
        }
        Ok(())
    }

    pub fn insert_item(&mut self, key: ItemKey) -> Result<(), VaultError> {
        if !self.items.insert(key) {
            return Err(VaultError::DuplicateEntry(key.to_string()));
        }
        Ok(())
    }

    pub fn remove_item(&mut self, key: &ItemKey) -> Result<(), VaultError> {
        if !self.items.remove(key) {
            return Err(VaultError::ItemNotFound(*key));
        }
        Ok(())
    }
}
