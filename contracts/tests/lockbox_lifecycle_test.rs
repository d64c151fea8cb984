//! Integration tests for the lockbox lifecycle: creation, metadata,
//! soulbound ownership and burn.

mod common;

use lockbox_contracts::vault::{AssetBatch, CallContext, LockboxStatus, VaultError};
use lockbox_protocol::operation::{BatchWithdrawal, OperationParams};
use lockbox_protocol::types::ItemKey;

use common::*;

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[test]
fn batch_creation_is_atomic() {
    let mut h = Harness::new();
    let mut batch = standard_batch();
    // Item 9 does not exist, so the last pull fails.
    batch.item_ids = vec![1, 9];

    let key = h.key.address();
    let err = h
        .vault
        .create_with_batch(&mut h.chain, alice().with_value(10), ALICE, key, &batch, reference())
        .unwrap_err();

    assert!(matches!(err, VaultError::External(_)));
    assert_eq!(h.vault.status(0), LockboxStatus::Uncreated);
    assert_eq!(h.native_balance(ALICE), STARTING_NATIVE);
    assert_eq!(h.token_balance(TOKEN_A, ALICE), STARTING_TOKENS);
    assert_eq!(h.chain.item_owner(COLLECTION, 1).unwrap(), Some(ALICE));
}

#[test]
fn item_creation_and_snapshot() {
    let mut h = Harness::new();
    let key = h.key.address();
    let id = h
        .vault
        .create_with_item(&mut h.chain, alice(), ALICE, key, COLLECTION, 2, reference())
        .unwrap();

    let snapshot = h.vault.full_lockbox(id).unwrap();
    assert_eq!(snapshot.holder, ALICE);
    assert_eq!(snapshot.nonce, 1);
    assert_eq!(snapshot.items, vec![ItemKey::new(COLLECTION, 2)]);
    assert_eq!(snapshot.created_at.timestamp(), START);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["native_balance"], 0);
}

#[test]
fn create_batch_rejects_mismatched_value() {
    let mut h = Harness::new();
    let key = h.key.address();
    let err = h
        .vault
        .create_with_batch(&mut h.chain, alice().with_value(9), ALICE, key, &standard_batch(), reference())
        .unwrap_err();
    assert_eq!(
        err,
        VaultError::NativeAmountMismatch {
            declared: 10,
            sent: 9
        }
    );
}

#[test]
fn empty_batch_creation_rejected() {
    let mut h = Harness::new();
    let key = h.key.address();
    let err = h
        .vault
        .create_with_batch(&mut h.chain, alice(), ALICE, key, &AssetBatch::default(), reference())
        .unwrap_err();
    assert_eq!(err, VaultError::ZeroAmount);
}

// ---------------------------------------------------------------------------
// Soulbound token
// ---------------------------------------------------------------------------

#[test]
fn lockboxes_are_locked_and_untransferable() {
    let mut h = Harness::new();
    let id = h.create_native(5);

    assert_eq!(h.vault.locked(id), Ok(true));
    assert_eq!(
        h.vault.transfer_lockbox(alice(), id, BOB),
        Err(VaultError::TransfersDisabled)
    );
    assert_eq!(
        h.vault.transfer_lockbox(CallContext::new(BOB), id, BOB),
        Err(VaultError::TransfersDisabled)
    );
    assert_eq!(h.vault.owner_of(id).unwrap(), ALICE);
    assert_eq!(h.vault.balance_of(&ALICE), 1);
    assert_eq!(h.vault.balance_of(&BOB), 0);
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[test]
fn custom_metadata_overrides_default() {
    let mut h = Harness::new();
    let id = h.create_native(5);
    h.vault
        .set_default_metadata_uri(CallContext::new(ADMIN), "https://meta.lockbox.test/")
        .unwrap();
    assert_eq!(h.vault.metadata_uri(id).unwrap(), "https://meta.lockbox.test/0");

    let params = OperationParams::SetMetadataUri {
        uri: "ipfs://custom".into(),
    };
    let signed = h.sign(id, &params);
    h.vault
        .set_metadata_uri(&mut h.chain, alice(), id, &signed, "ipfs://custom")
        .unwrap();
    assert_eq!(h.vault.metadata_uri(id).unwrap(), "ipfs://custom");

    let clear = OperationParams::SetMetadataUri { uri: String::new() };
    let signed = h.sign(id, &clear);
    h.vault
        .set_metadata_uri(&mut h.chain, alice(), id, &signed, "")
        .unwrap();
    assert_eq!(h.vault.metadata_uri(id).unwrap(), "https://meta.lockbox.test/0");
}

// ---------------------------------------------------------------------------
// Burn
// ---------------------------------------------------------------------------

#[test]
fn burn_requires_empty_ledger() {
    let mut h = Harness::new();
    let id = h.create_native(5);
    let signed = h.sign(id, &OperationParams::Burn);

    let err = h
        .vault
        .burn(&mut h.chain, alice(), id, &signed)
        .unwrap_err();

    assert_eq!(err, VaultError::LedgerNotEmpty(id));
    assert_eq!(h.vault.status(id), LockboxStatus::Active);
    assert_eq!(h.vault.nonce(id).unwrap(), 1);
}

#[test]
fn drained_lockbox_burns_and_id_is_never_reused() {
    let mut h = Harness::new();
    let id = h.create_batch(&standard_batch());

    let batch = BatchWithdrawal {
        native_amount: 10,
        tokens: vec![TOKEN_A, TOKEN_B],
        amounts: vec![500, 300],
        collections: vec![COLLECTION, COLLECTION],
        item_ids: vec![1, 2],
        recipient: ALICE,
    };
    let signed = h.sign(id, &OperationParams::BatchWithdraw(batch.clone()));
    h.vault
        .batch_withdraw(&mut h.chain, alice(), id, &signed, &batch)
        .unwrap();

    let signed = h.sign(id, &OperationParams::Burn);
    h.vault.burn(&mut h.chain, alice(), id, &signed).unwrap();

    assert_eq!(h.vault.status(id), LockboxStatus::Burned);
    assert_eq!(h.vault.owner_of(id), Err(VaultError::NonexistentLockbox(id)));
    assert_eq!(h.vault.nonce(id), Err(VaultError::NonexistentLockbox(id)));
    assert_eq!(
        h.vault.authorization_key(id),
        Err(VaultError::NonexistentLockbox(id))
    );
    assert_eq!(h.vault.balance_of(&ALICE), 0);

    // Burned is terminal: the old signature cannot resurrect it.
    assert!(h.vault.burn(&mut h.chain, alice(), id, &signed).is_err());

    let next = h.create_native(1);
    assert_ne!(next, id);
    assert_eq!(h.vault.status(id), LockboxStatus::Burned);
}

#[test]
fn unknown_ids_report_uncreated() {
    let h = Harness::new();
    assert_eq!(h.vault.status(0), LockboxStatus::Uncreated);
    assert_eq!(h.vault.locked(0), Err(VaultError::NonexistentLockbox(0)));
    assert!(h
        .vault
        .full_lockbox(0)
        .is_err_and(|e| e == VaultError::NonexistentLockbox(0)));
}
