//! Integration tests for signed withdrawals and ledger enumeration.

mod common;

use lockbox_contracts::vault::{ErrorClass, TokenEntry, VaultError};
use lockbox_protocol::operation::{BatchWithdrawal, OperationParams};
use lockbox_protocol::types::{Address, ItemKey};

use common::*;

fn withdraw_token(token: Address, amount: u128) -> OperationParams {
    OperationParams::WithdrawToken {
        token,
        amount,
        recipient: BOB,
    }
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn batch_create_then_drain_one_token() {
    let mut h = Harness::new();
    let id = h.create_batch(&standard_batch());

    let snapshot = h.vault.full_lockbox(id).unwrap();
    assert_eq!(snapshot.native_balance, 10);
    assert_eq!(snapshot.tokens.len(), 2);
    assert_eq!(snapshot.items.len(), 2);

    let signed = h.sign(id, &withdraw_token(TOKEN_A, 500));
    h.vault
        .withdraw_token(&mut h.chain, alice(), id, &signed, TOKEN_A, 500, BOB)
        .unwrap();

    let snapshot = h.vault.full_lockbox(id).unwrap();
    assert_eq!(
        snapshot.tokens,
        vec![TokenEntry {
            token: TOKEN_B,
            balance: 300
        }]
    );
    assert_eq!(h.vault.token_balance(id, &TOKEN_A).unwrap(), 0);
    assert_eq!(snapshot.native_balance, 10);
    assert_eq!(
        snapshot.items,
        vec![ItemKey::new(COLLECTION, 1), ItemKey::new(COLLECTION, 2)]
    );
    assert_eq!(h.token_balance(TOKEN_A, BOB), 500);
}

#[test]
fn enumeration_never_holds_duplicates_or_zero_entries() {
    let mut h = Harness::new();
    let id = h.create_token(TOKEN_A, 100);

    h.vault
        .deposit_token(&mut h.chain, alice(), id, TOKEN_B, 50, reference())
        .unwrap();
    h.vault
        .deposit_token(&mut h.chain, alice(), id, TOKEN_A, 25, reference())
        .unwrap();

    let steps = [(TOKEN_A, 60), (TOKEN_B, 50), (TOKEN_A, 65)];
    for (token, amount) in steps {
        let signed = h.sign(id, &withdraw_token(token, amount));
        h.vault
            .withdraw_token(&mut h.chain, alice(), id, &signed, token, amount, BOB)
            .unwrap();

        let tokens = h.vault.full_lockbox(id).unwrap().tokens;
        let mut seen = std::collections::HashSet::new();
        for entry in &tokens {
            assert!(seen.insert(entry.token), "duplicate {}", entry.token);
            assert!(entry.balance > 0, "zero entry for {}", entry.token);
        }
    }

    assert!(h.vault.full_lockbox(id).unwrap().tokens.is_empty());

    h.vault
        .deposit_token(&mut h.chain, alice(), id, TOKEN_B, 7, reference())
        .unwrap();
    assert_eq!(
        h.vault.full_lockbox(id).unwrap().tokens,
        vec![TokenEntry {
            token: TOKEN_B,
            balance: 7
        }]
    );
}

// ---------------------------------------------------------------------------
// Single-asset withdrawals
// ---------------------------------------------------------------------------

#[test]
fn item_withdrawal_returns_item() {
    let mut h = Harness::new();
    let id = h.create_batch(&standard_batch());
    let params = OperationParams::WithdrawItem {
        collection: COLLECTION,
        item_id: 1,
        recipient: BOB,
    };
    let signed = h.sign(id, &params);
    h.vault
        .withdraw_item(&mut h.chain, alice(), id, &signed, COLLECTION, 1, BOB)
        .unwrap();

    assert_eq!(h.chain.item_owner(COLLECTION, 1).unwrap(), Some(BOB));
    assert_eq!(
        h.vault.full_lockbox(id).unwrap().items,
        vec![ItemKey::new(COLLECTION, 2)]
    );
}

#[test]
fn item_not_held_is_not_found() {
    let mut h = Harness::new();
    let id = h.create_native(1);
    let params = OperationParams::WithdrawItem {
        collection: COLLECTION,
        item_id: 4,
        recipient: BOB,
    };
    let signed = h.sign(id, &params);
    let err = h
        .vault
        .withdraw_item(&mut h.chain, alice(), id, &signed, COLLECTION, 4, BOB)
        .unwrap_err();
    assert_eq!(err, VaultError::ItemNotFound(ItemKey::new(COLLECTION, 4)));
    assert_eq!(h.vault.nonce(id).unwrap(), 1);
}

#[test]
fn overdrawing_token_rejected() {
    let mut h = Harness::new();
    let id = h.create_token(TOKEN_A, 100);
    let signed = h.sign(id, &withdraw_token(TOKEN_A, 101));
    let err = h
        .vault
        .withdraw_token(&mut h.chain, alice(), id, &signed, TOKEN_A, 101, BOB)
        .unwrap_err();
    assert_eq!(
        err,
        VaultError::InsufficientTokenBalance {
            token: TOKEN_A,
            available: 100,
            requested: 101
        }
    );
}

#[test]
fn rejecting_recipient_rolls_back() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    h.chain.reject_native(BOB);

    let params = OperationParams::WithdrawNative {
        amount: 100,
        recipient: BOB,
    };
    let signed = h.sign(id, &params);
    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, BOB)
        .unwrap_err();

    assert_eq!(err, VaultError::NativeTransferRejected(BOB));
    assert_eq!(err.class(), ErrorClass::ExternalInteraction);
    assert_eq!(h.vault.native_balance(id).unwrap(), 1_000);
    assert_eq!(h.vault.nonce(id).unwrap(), 1);
    assert_eq!(h.native_balance(VAULT), 1_000);
}

#[test]
fn vault_and_zero_recipients_rejected() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);

    for (recipient, expected) in [
        (VAULT, VaultError::InvalidRecipient(VAULT)),
        (Address::ZERO, VaultError::ZeroAddress),
    ] {
        let params = OperationParams::WithdrawNative {
            amount: 1,
            recipient,
        };
        let signed = h.sign(id, &params);
        let err = h
            .vault
            .withdraw_native(&mut h.chain, alice(), id, &signed, 1, recipient)
            .unwrap_err();
        assert_eq!(err, expected);
    }
}

// ---------------------------------------------------------------------------
// Batch withdrawal
// ---------------------------------------------------------------------------

fn full_batch() -> BatchWithdrawal {
    BatchWithdrawal {
        native_amount: 10,
        tokens: vec![TOKEN_A, TOKEN_B],
        amounts: vec![500, 300],
        collections: vec![COLLECTION, COLLECTION],
        item_ids: vec![1, 2],
        recipient: BOB,
    }
}

#[test]
fn batch_withdraw_empties_lockbox() {
    let mut h = Harness::new();
    let id = h.create_batch(&standard_batch());
    let batch = full_batch();
    let signed = h.sign(id, &OperationParams::BatchWithdraw(batch.clone()));

    h.vault
        .batch_withdraw(&mut h.chain, alice(), id, &signed, &batch)
        .unwrap();

    let snapshot = h.vault.full_lockbox(id).unwrap();
    assert_eq!(snapshot.native_balance, 0);
    assert!(snapshot.tokens.is_empty());
    assert!(snapshot.items.is_empty());
    assert_eq!(h.native_balance(BOB), 10);
    assert_eq!(h.token_balance(TOKEN_B, BOB), 300);
    assert_eq!(h.chain.item_owner(COLLECTION, 2).unwrap(), Some(BOB));
}

#[test]
fn batch_length_mismatch_reverts_before_transfer() {
    let mut h = Harness::new();
    let id = h.create_batch(&standard_batch());
    let mut batch = full_batch();
    batch.amounts.pop();
    let signed = h.sign(id, &OperationParams::BatchWithdraw(batch.clone()));

    let err = h
        .vault
        .batch_withdraw(&mut h.chain, alice(), id, &signed, &batch)
        .unwrap_err();

    assert!(matches!(err, VaultError::LengthMismatch { .. }));
    assert_eq!(h.vault.nonce(id).unwrap(), 1);
    assert_eq!(h.native_balance(BOB), 0);
    assert_eq!(h.token_balance(TOKEN_A, BOB), 0);
}

#[test]
fn batch_duplicate_item_reverts_before_transfer() {
    let mut h = Harness::new();
    let id = h.create_batch(&standard_batch());
    let mut batch = full_batch();
    batch.item_ids = vec![1, 1];
    let signed = h.sign(id, &OperationParams::BatchWithdraw(batch.clone()));

    let err = h
        .vault
        .batch_withdraw(&mut h.chain, alice(), id, &signed, &batch)
        .unwrap_err();

    assert!(matches!(err, VaultError::DuplicateEntry(_)));
    assert_eq!(h.chain.item_owner(COLLECTION, 1).unwrap(), Some(VAULT));
    assert_eq!(h.native_balance(BOB), 0);
    assert_eq!(h.vault.full_lockbox(id).unwrap().tokens.len(), 2);
}

#[test]
fn batch_failure_midway_unwinds_earlier_transfers() {
    let mut h = Harness::new();
    let id = h.create_batch(&standard_batch());
    let mut batch = full_batch();
    batch.amounts = vec![500, 301];
    let signed = h.sign(id, &OperationParams::BatchWithdraw(batch.clone()));

    let err = h
        .vault
        .batch_withdraw(&mut h.chain, alice(), id, &signed, &batch)
        .unwrap_err();

    assert!(matches!(err, VaultError::InsufficientTokenBalance { .. }));
    assert_eq!(h.native_balance(BOB), 0);
    assert_eq!(h.token_balance(TOKEN_A, BOB), 0);
    assert_eq!(h.vault.token_balance(id, &TOKEN_A).unwrap(), 500);
}
