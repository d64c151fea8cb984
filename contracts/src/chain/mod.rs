//! # Host Chain
//!
//! The world the vault lives in: native balances, token contracts, item
//! collections, swap routers and a clock. The vault only ever reaches
//! external assets through the methods here, which makes it possible to
//! test it against hostile assets (fee-on-transfer tokens, accounts that
//! refuse native payments, routers that overspend) without a real chain.
//!
//! `Chain` is `Clone`. The vault snapshots it before every state-changing
//! call and puts the snapshot back if the call fails, which is how a failed
//! entry point leaves no trace anywhere.

pub mod collection;
pub mod router;
pub mod token;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use lockbox_protocol::types::{Address, Amount, ItemId};

pub use collection::{CollectionBehavior, ItemCollection};
pub use router::{ConstantRateCall, ConstantRateRouter, Router, RouterCall, RouterError};
pub use token::{FungibleToken, TokenBehavior};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures raised by host-chain contracts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("no token contract at {0}")]
    UnknownToken(Address),

    #[error("no collection contract at {0}")]
    UnknownCollection(Address),

    #[error("no router registered at {0}")]
    UnknownRouter(Address),

    #[error("{account} has {available} native, needs {requested}")]
    InsufficientNative {
        account: Address,
        available: Amount,
        requested: Amount,
    },

    /// The recipient refuses native transfers.
    #[error("{0} rejected the native transfer")]
    NativeTransferRejected(Address),

    #[error("{account} holds {available} of token {token}, needs {requested}")]
    InsufficientTokenBalance {
        token: Address,
        account: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("allowance {allowance} from {owner} to {spender} on {token} is below {requested}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        allowance: Amount,
        requested: Amount,
    },

    #[error("item {collection}#{item_id} does not exist")]
    UnknownItem { collection: Address, item_id: ItemId },

    #[error("item {collection}#{item_id} already exists")]
    ItemAlreadyMinted { collection: Address, item_id: ItemId },

    #[error("item {collection}#{item_id} is not owned by {from}")]
    ItemNotOwned {
        collection: Address,
        item_id: ItemId,
        from: Address,
    },

    #[error("{operator} is not approved for {collection}#{item_id}")]
    NotApproved {
        collection: Address,
        item_id: ItemId,
        operator: Address,
    },

    #[error("arithmetic overflow")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// In-memory host chain.
#[derive(Clone, Debug)]
pub struct Chain {
    now: DateTime<Utc>,
    native: HashMap<Address, Amount>,
    native_rejecters: HashSet<Address>,
    tokens: HashMap<Address, FungibleToken>,
    collections: HashMap<Address, ItemCollection>,
    routers: HashMap<Address, Arc<dyn Router>>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// A chain whose clock starts at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            native: HashMap::new(),
            native_rejecters: HashSet::new(),
            tokens: HashMap::new(),
            collections: HashMap::new(),
            routers: HashMap::new(),
        }
    }

    // -- Clock --------------------------------------------------------------

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Current block time in unix seconds.
    pub fn unix_time(&self) -> u64 {
        u64::try_from(self.now.timestamp()).unwrap_or(0)
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    // -- Native currency ----------------------------------------------------

    pub fn native_balance(&self, account: &Address) -> Amount {
        self.native.get(account).copied().unwrap_or(0)
    }

    pub fn mint_native(&mut self, account: Address, amount: Amount) -> Result<(), ChainError> {
        let balance = self.native.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(ChainError::Overflow)?;
        Ok(())
    }

    /// Marks `account` as refusing all incoming native transfers.
    pub fn reject_native(&mut self, account: Address) {
        self.native_rejecters.insert(account);
    }

    pub fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        if self.native_rejecters.contains(&to) {
            return Err(ChainError::NativeTransferRejected(to));
        }
        let available = self.native_balance(&from);
        if available < amount {
            return Err(ChainError::InsufficientNative {
                account: from,
                available,
                requested: amount,
            });
        }
        self.native.insert(from, available - amount);
        self.mint_native(to, amount)
    }

    // -- Fungible tokens ----------------------------------------------------

    pub fn deploy_token(&mut self, address: Address, token: FungibleToken) {
        self.tokens.insert(address, token);
    }

    pub fn token(&self, address: &Address) -> Option<&FungibleToken> {
        self.tokens.get(address)
    }

    fn token_mut(&mut self, address: Address) -> Result<&mut FungibleToken, ChainError> {
        self.tokens
            .get_mut(&address)
            .ok_or(ChainError::UnknownToken(address))
    }

    pub fn token_balance(&self, token: Address, account: &Address) -> Result<Amount, ChainError> {
        self.token(&token)
            .map(|t| t.balance_of(account))
            .ok_or(ChainError::UnknownToken(token))
    }

    pub fn allowance(
        &self,
        token: Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount, ChainError> {
        self.token(&token)
            .map(|t| t.allowance(owner, spender))
            .ok_or(ChainError::UnknownToken(token))
    }

    pub fn mint_tokens(
        &mut self,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        self.token_mut(token)?.mint(to, amount)
    }

    pub fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        self.token_mut(token)?.approve(owner, spender, amount);
        Ok(())
    }

    pub fn transfer_tokens(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        self.token_mut(token)?.transfer(token, from, to, amount)
    }

    pub fn transfer_tokens_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        self.token_mut(token)?
            .transfer_from(token, spender, from, to, amount)
    }

    // -- Item collections ---------------------------------------------------

    pub fn deploy_collection(&mut self, address: Address, collection: ItemCollection) {
        self.collections.insert(address, collection);
    }

    fn collection_mut(&mut self, address: Address) -> Result<&mut ItemCollection, ChainError> {
        self.collections
            .get_mut(&address)
            .ok_or(ChainError::UnknownCollection(address))
    }

    pub fn item_owner(&self, collection: Address, item_id: ItemId) -> Result<Option<Address>, ChainError> {
        self.collections
            .get(&collection)
            .map(|c| c.owner_of(item_id))
            .ok_or(ChainError::UnknownCollection(collection))
    }

    pub fn mint_item(
        &mut self,
        collection: Address,
        to: Address,
        item_id: ItemId,
    ) -> Result<(), ChainError> {
        self.collection_mut(collection)?.mint(collection, to, item_id)
    }

    pub fn set_approval_for_all(
        &mut self,
        collection: Address,
        owner: Address,
        operator: Address,
        approved: bool,
    ) -> Result<(), ChainError> {
        self.collection_mut(collection)?
            .set_approval_for_all(owner, operator, approved);
        Ok(())
    }

    pub fn transfer_item_from(
        &mut self,
        collection: Address,
        operator: Address,
        from: Address,
        to: Address,
        item_id: ItemId,
    ) -> Result<(), ChainError> {
        self.collection_mut(collection)?
            .transfer_from(collection, operator, from, to, item_id)
    }

    // -- Routers ------------------------------------------------------------

    pub fn register_router(&mut self, address: Address, router: Arc<dyn Router>) {
        self.routers.insert(address, router);
    }

    pub fn is_router(&self, address: &Address) -> bool {
        self.routers.contains_key(address)
    }

    /// Calls the router at `router`, first moving `value` native from
    /// `caller` to it.
    pub fn call_router(
        &mut self,
        router: Address,
        caller: Address,
        value: Amount,
        call_data: &[u8],
    ) -> Result<Vec<u8>, RouterError> {
        let code = self
            .routers
            .get(&router)
            .cloned()
            .ok_or(ChainError::UnknownRouter(router))?;

        if value > 0 {
            self.transfer_native(caller, router, value)?;
        }

        code.execute(
            self,
            RouterCall {
                router,
                caller,
                value,
                call_data,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = Address::from_low_u64(0xA);
    const BOB: Address = Address::from_low_u64(0xB);
    const TOKEN: Address = Address::from_low_u64(0x70);
    const ROUTER: Address = Address::from_low_u64(0x80);

    #[test]
    fn native_transfer_moves_balance() {
        let mut chain = Chain::new();
        chain.mint_native(ALICE, 100).unwrap();
        chain.transfer_native(ALICE, BOB, 40).unwrap();
        assert_eq!(chain.native_balance(&ALICE), 60);
        assert_eq!(chain.native_balance(&BOB), 40);
    }

    #[test]
    fn rejecting_account_refuses_native() {
        let mut chain = Chain::new();
        chain.mint_native(ALICE, 100).unwrap();
        chain.reject_native(BOB);
        assert_eq!(
            chain.transfer_native(ALICE, BOB, 1),
            Err(ChainError::NativeTransferRejected(BOB))
        );
        assert_eq!(chain.native_balance(&ALICE), 100);
    }

    #[test]
    fn unknown_token_is_an_error() {
        let chain = Chain::new();
        assert_eq!(
            chain.token_balance(TOKEN, &ALICE),
            Err(ChainError::UnknownToken(TOKEN))
        );
    }

    #[test]
    fn clock_advances() {
        let mut chain = Chain::new();
        let before = chain.unix_time();
        chain.advance(Duration::seconds(90));
        assert_eq!(chain.unix_time(), before + 90);
    }

    #[test]
    fn constant_rate_router_swaps_token_for_native() {
        let mut chain = Chain::new();
        chain.deploy_token(TOKEN, FungibleToken::new("T", TokenBehavior::Standard));
        chain.mint_tokens(TOKEN, ALICE, 1_000).unwrap();
        chain.mint_native(ROUTER, 10_000).unwrap();
        chain.register_router(ROUTER, Arc::new(ConstantRateRouter::new(2, 1)));
        chain.approve(TOKEN, ALICE, ROUTER, 300).unwrap();

        let call = ConstantRateCall {
            token_in: lockbox_protocol::SwapAsset::Token(TOKEN),
            token_out: lockbox_protocol::SwapAsset::Native,
            amount_in: 300,
            pay_to: None,
        }
        .encode()
        .unwrap();
        chain.call_router(ROUTER, ALICE, 0, &call).unwrap();

        assert_eq!(chain.token_balance(TOKEN, &ALICE).unwrap(), 700);
        assert_eq!(chain.native_balance(&ALICE), 600);
        assert_eq!(chain.allowance(TOKEN, &ALICE, &ROUTER).unwrap(), 0);
    }

    #[test]
    fn unregistered_router_call_fails() {
        let mut chain = Chain::new();
        let err = chain.call_router(ROUTER, ALICE, 0, b"").unwrap_err();
        assert!(matches!(err, RouterError::Chain(ChainError::UnknownRouter(_))));
    }
}
