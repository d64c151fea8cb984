//! Integration tests for the operation gate: holder identity, signature,
//! nonce and expiry, exercised through real vault entry points.

mod common;

use chrono::Duration;

use common::*;
use lockbox_contracts::vault::{CallContext, ErrorClass, VaultError};
use lockbox_protocol::operation::OperationParams;

fn withdraw(amount: u128) -> OperationParams {
    OperationParams::WithdrawNative {
        amount,
        recipient: BOB,
    }
}

// ---------------------------------------------------------------------------
// Happy path and replay
// ---------------------------------------------------------------------------

#[test]
fn signed_withdrawal_consumes_exactly_one_nonce() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    assert_eq!(h.vault.nonce(id).unwrap(), 1);

    let signed = h.sign(id, &withdraw(100));
    h.vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, BOB)
        .unwrap();

    assert_eq!(h.vault.nonce(id).unwrap(), 2);
    assert_eq!(h.vault.native_balance(id).unwrap(), 900);
    assert_eq!(h.native_balance(BOB), 100);
}

#[test]
fn replay_is_stale_and_changes_nothing() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let signed = h.sign(id, &withdraw(100));
    h.vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, BOB)
        .unwrap();

    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, BOB)
        .unwrap_err();

    assert_eq!(
        err,
        VaultError::StaleNonce {
            expected: 2,
            provided: 1
        }
    );
    assert_eq!(err.class(), ErrorClass::Authorization);
    assert_eq!(h.vault.nonce(id).unwrap(), 2);
    assert_eq!(h.vault.native_balance(id).unwrap(), 900);
    assert_eq!(h.native_balance(BOB), 100);
}

#[test]
fn nonces_strictly_increase_across_operation_types() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let mut last = h.vault.nonce(id).unwrap();

    for amount in [1, 2, 3] {
        let signed = h.sign(id, &withdraw(amount));
        h.vault
            .withdraw_native(&mut h.chain, alice(), id, &signed, amount, BOB)
            .unwrap();
        let now = h.vault.nonce(id).unwrap();
        assert_eq!(now, last + 1);
        last = now;
    }

    let uri = OperationParams::SetMetadataUri {
        uri: "ipfs://box".into(),
    };
    let signed = h.sign(id, &uri);
    h.vault
        .set_metadata_uri(&mut h.chain, alice(), id, &signed, "ipfs://box")
        .unwrap();
    assert_eq!(h.vault.nonce(id).unwrap(), last + 1);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn wrong_key_rejected_without_nonce_advance() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let forged = h.sign_with(&key(9), id, 1, ALICE, &withdraw(100));

    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &forged, 100, BOB)
        .unwrap_err();

    assert_eq!(err, VaultError::InvalidSignature);
    assert_eq!(h.vault.nonce(id).unwrap(), 1);
    assert_eq!(h.vault.native_balance(id).unwrap(), 1_000);
}

#[test]
fn substituted_parameters_mismatch_struct_hash() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let signed = h.sign(id, &withdraw(100));

    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, MALLORY)
        .unwrap_err();
    assert_eq!(err, VaultError::StructHashMismatch);

    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 999, BOB)
        .unwrap_err();
    assert_eq!(err, VaultError::StructHashMismatch);
    assert_eq!(h.native_balance(MALLORY), 0);
}

#[test]
fn non_holder_cannot_use_valid_signature() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let signed = h.sign_with(&h.key.clone(), id, 1, MALLORY, &withdraw(100));

    let err = h
        .vault
        .withdraw_native(&mut h.chain, CallContext::new(MALLORY), id, &signed, 100, MALLORY)
        .unwrap_err();

    assert_eq!(
        err,
        VaultError::NotHolder {
            lockbox_id: id,
            caller: MALLORY
        }
    );
    assert_eq!(err.class(), ErrorClass::State);
}

#[test]
fn holder_checked_before_expiry_and_nonce() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let signed = h.sign_with(&h.key.clone(), id, 7, MALLORY, &withdraw(100));

    h.chain.advance(Duration::seconds(VALIDITY as i64 + 1));
    let err = h
        .vault
        .withdraw_native(&mut h.chain, CallContext::new(MALLORY), id, &signed, 100, MALLORY)
        .unwrap_err();
    assert!(matches!(err, VaultError::NotHolder { .. }));

    // The holder gets the next check in line: expiry before the bad nonce.
    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, MALLORY)
        .unwrap_err();
    assert!(matches!(err, VaultError::SignatureExpired { .. }));
    assert_eq!(h.vault.nonce(id).unwrap(), 1);
}

#[test]
fn signature_for_another_caller_rejected() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let signed = h.sign_with(&h.key.clone(), id, 1, BOB, &withdraw(100));

    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, BOB)
        .unwrap_err();
    assert_eq!(err, VaultError::StructHashMismatch);
}

#[test]
fn expired_signature_rejected() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let signed = h.sign(id, &withdraw(100));

    h.chain.advance(Duration::seconds(VALIDITY as i64 + 1));
    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, BOB)
        .unwrap_err();

    assert!(matches!(err, VaultError::SignatureExpired { .. }));
    assert_eq!(h.vault.nonce(id).unwrap(), 1);
}

#[test]
fn signature_valid_through_its_expiry_second() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let signed = h.sign(id, &withdraw(100));

    h.chain.advance(Duration::seconds(VALIDITY as i64));
    h.vault
        .withdraw_native(&mut h.chain, alice(), id, &signed, 100, BOB)
        .unwrap();
}

#[test]
fn failed_call_keeps_nonce_for_resubmission() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);

    let too_much = h.sign(id, &withdraw(5_000));
    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), id, &too_much, 5_000, BOB)
        .unwrap_err();
    assert_eq!(
        err,
        VaultError::InsufficientNativeBalance {
            available: 1_000,
            requested: 5_000
        }
    );
    assert_eq!(h.vault.nonce(id).unwrap(), 1);

    let retry = h.sign(id, &withdraw(1_000));
    h.vault
        .withdraw_native(&mut h.chain, alice(), id, &retry, 1_000, BOB)
        .unwrap();
    assert_eq!(h.vault.nonce(id).unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Key rotation
// ---------------------------------------------------------------------------

#[test]
fn rotated_out_key_is_dead_immediately() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let new_key = key(2);

    let rotate = h.sign(
        id,
        &OperationParams::RotateKey {
            new_key: new_key.address(),
        },
    );
    h.vault
        .rotate_key(&mut h.chain, alice(), id, &rotate, new_key.address())
        .unwrap();
    assert_eq!(h.vault.authorization_key(id).unwrap(), new_key.address());

    let old = h.sign(id, &withdraw(10));
    assert_eq!(
        h.vault
            .withdraw_native(&mut h.chain, alice(), id, &old, 10, BOB)
            .unwrap_err(),
        VaultError::InvalidSignature
    );

    let nonce = h.vault.nonce(id).unwrap();
    let fresh = h.sign_with(&new_key, id, nonce, ALICE, &withdraw(10));
    h.vault
        .withdraw_native(&mut h.chain, alice(), id, &fresh, 10, BOB)
        .unwrap();
}

#[test]
fn rotation_to_zero_key_rejected() {
    let mut h = Harness::new();
    let id = h.create_native(1_000);
    let zero = lockbox_protocol::types::Address::ZERO;
    let signed = h.sign(id, &OperationParams::RotateKey { new_key: zero });

    let err = h
        .vault
        .rotate_key(&mut h.chain, alice(), id, &signed, zero)
        .unwrap_err();
    assert_eq!(err, VaultError::ZeroKey);
    assert_eq!(err.class(), ErrorClass::InputValidation);
}

#[test]
fn unknown_lockbox_is_nonexistent() {
    let mut h = Harness::new();
    let signed = h.sign_with(&h.key.clone(), 7, 1, ALICE, &withdraw(1));
    let err = h
        .vault
        .withdraw_native(&mut h.chain, alice(), 7, &signed, 1, BOB)
        .unwrap_err();
    assert_eq!(err, VaultError::NonexistentLockbox(7));
}
