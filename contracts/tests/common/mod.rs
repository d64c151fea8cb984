//! Shared harness for vault integration tests.
//!
//! A fixed-clock chain with two standard tokens, a 10% fee token, a
//! collection holding items 1..=4 for Alice, and a 2:1 constant-rate
//! router with inventory. Alice has approved the vault for everything.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use lockbox_contracts::chain::{
    Chain, CollectionBehavior, ConstantRateCall, ConstantRateRouter, FungibleToken,
    ItemCollection, TokenBehavior,
};
use lockbox_contracts::vault::{AssetBatch, CallContext, LockboxVault};
use lockbox_protocol::crypto::AuthorizationKeypair;
use lockbox_protocol::operation::{sign_operation, OperationParams, SignedOperation, SigningRequest};
use lockbox_protocol::types::{Address, Amount, LockboxId, ReferenceId, SwapAsset};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const VAULT: Address = Address::from_low_u64(0x10C4_B0C5);
pub const ADMIN: Address = Address::from_low_u64(0xAD);
pub const ALICE: Address = Address::from_low_u64(0xA11CE);
pub const BOB: Address = Address::from_low_u64(0xB0B);
pub const MALLORY: Address = Address::from_low_u64(0xBAD);

pub const TOKEN_A: Address = Address::from_low_u64(0x7A);
pub const TOKEN_B: Address = Address::from_low_u64(0x7B);
pub const FEE_TOKEN: Address = Address::from_low_u64(0x7F);
pub const COLLECTION: Address = Address::from_low_u64(0xC0);
pub const ROUTER: Address = Address::from_low_u64(0x80);

pub const CHAIN_ID: u64 = 31_337;
pub const START: i64 = 1_700_000_000;
pub const VALIDITY: u64 = 3_600;

pub const STARTING_NATIVE: Amount = 1_000_000;
pub const STARTING_TOKENS: Amount = 100_000;
pub const ROUTER_INVENTORY: Amount = 1_000_000;

pub fn key(seed: u8) -> AuthorizationKeypair {
    AuthorizationKeypair::from_secret_bytes(&[seed; 32]).unwrap()
}

/// Alice calling with no value attached.
pub fn alice() -> CallContext {
    CallContext::new(ALICE)
}

pub fn reference() -> ReferenceId {
    ReferenceId::from_bytes([0x42; 32])
}

pub struct Harness {
    pub chain: Chain,
    pub vault: LockboxVault,
    pub key: AuthorizationKeypair,
}

impl Harness {
    pub fn new() -> Self {
        let mut chain = Chain::at(Utc.timestamp_opt(START, 0).unwrap());

        chain.mint_native(ALICE, STARTING_NATIVE).unwrap();
        chain.mint_native(ROUTER, ROUTER_INVENTORY).unwrap();

        for (address, symbol, behavior) in [
            (TOKEN_A, "AAA", TokenBehavior::Standard),
            (TOKEN_B, "BBB", TokenBehavior::Standard),
            (FEE_TOKEN, "FEE", TokenBehavior::FeeOnTransfer { fee_bps: 1_000 }),
        ] {
            chain.deploy_token(address, FungibleToken::new(symbol, behavior));
            chain.mint_tokens(address, ALICE, STARTING_TOKENS).unwrap();
            chain.mint_tokens(address, ROUTER, ROUTER_INVENTORY).unwrap();
            chain.approve(address, ALICE, VAULT, Amount::MAX).unwrap();
        }

        chain.deploy_collection(COLLECTION, ItemCollection::new("Relics", CollectionBehavior::Standard));
        for id in 1..=4 {
            chain.mint_item(COLLECTION, ALICE, id).unwrap();
        }
        chain.set_approval_for_all(COLLECTION, ALICE, VAULT, true).unwrap();

        chain.register_router(ROUTER, Arc::new(ConstantRateRouter::new(2, 1)));

        Self {
            chain,
            vault: LockboxVault::new(VAULT, ADMIN, CHAIN_ID),
            key: key(1),
        }
    }

    pub fn now(&self) -> u64 {
        self.chain.unix_time()
    }

    // -- Signing ------------------------------------------------------------

    /// Signs `params` with the harness key for Alice at the current nonce.
    pub fn sign(&self, lockbox_id: LockboxId, params: &OperationParams) -> SignedOperation {
        let nonce = self.vault.nonce(lockbox_id).unwrap();
        self.sign_with(&self.key, lockbox_id, nonce, ALICE, params)
    }

    pub fn sign_with(
        &self,
        key: &AuthorizationKeypair,
        lockbox_id: LockboxId,
        nonce: u64,
        caller: Address,
        params: &OperationParams,
    ) -> SignedOperation {
        let request = SigningRequest {
            lockbox_id,
            nonce,
            caller,
            reference_id: reference(),
            expiry: self.now() + VALIDITY,
        };
        sign_operation(key, self.vault.domain(), &request, params).unwrap()
    }

    // -- Creation shortcuts -------------------------------------------------

    pub fn create_native(&mut self, amount: Amount) -> LockboxId {
        let ctx = alice().with_value(amount);
        self.vault
            .create_with_native(&mut self.chain, ctx, ALICE, self.key.address(), reference())
            .unwrap()
    }

    pub fn create_token(&mut self, token: Address, amount: Amount) -> LockboxId {
        let ctx = alice();
        self.vault
            .create_with_token(&mut self.chain, ctx, ALICE, self.key.address(), token, amount, reference())
            .unwrap()
    }

    pub fn create_batch(&mut self, batch: &AssetBatch) -> LockboxId {
        let ctx = alice().with_value(batch.native_amount);
        self.vault
            .create_with_batch(&mut self.chain, ctx, ALICE, self.key.address(), batch, reference())
            .unwrap()
    }

    // -- Chain views --------------------------------------------------------

    pub fn token_balance(&self, token: Address, account: Address) -> Amount {
        self.chain.token_balance(token, &account).unwrap()
    }

    pub fn native_balance(&self, account: Address) -> Amount {
        self.chain.native_balance(&account)
    }
}

/// The end-to-end fixture batch: native 10, A:500, B:300, items 1 and 2.
pub fn standard_batch() -> AssetBatch {
    AssetBatch {
        native_amount: 10,
        tokens: vec![TOKEN_A, TOKEN_B],
        amounts: vec![500, 300],
        collections: vec![COLLECTION, COLLECTION],
        item_ids: vec![1, 2],
    }
}

/// Call data for the harness router.
pub fn route(token_in: SwapAsset, token_out: SwapAsset, amount_in: Amount) -> Vec<u8> {
    ConstantRateCall {
        token_in,
        token_out,
        amount_in,
        pay_to: None,
    }
    .encode()
    .unwrap()
}
