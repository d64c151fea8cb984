// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Lockbox Protocol: Core Library
//!
//! Primitives shared by the Lockbox vault contract and the off-chain tools
//! that drive it. A lockbox is a non-transferable vault token whose
//! contents move only when a *delegated* authorization key signs for it.
//! This crate is where that signature lives.
//!
//! ## Architecture
//!
//! - **types**: addresses, ids, amounts, swap asset selectors.
//! - **crypto**: Keccak-256, secp256k1 authorization keys, signer recovery.
//! - **operation**: the signed, nonce-bound, expiring operation format.
//! - **config**: domain constants and fixed sizes.
//!
//! ## Design Philosophy
//!
//! 1. Signatures bind everything the vault will act on. If a parameter can
//!    change what happens, it is inside the hash.
//! 2. Every digest is domain separated. A signature for one deployment is
//!    noise on every other.
//! 3. No floating point near money. Amounts are `u128`, full stop.

pub mod config;
pub mod crypto;
pub mod operation;
pub mod types;

pub use types::{Address, Amount, Digest, ItemId, ItemKey, LockboxId, ReferenceId};
pub use types::{SwapAsset, SwapRecipient};
