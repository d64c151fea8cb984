//! # Hashing Utilities
//!
//! Keccak-256 is the only hash function Lockbox uses. Typed-data digests,
//! type hashes, parameter hashes and address derivation all go through it,
//! which keeps signatures interchangeable with standard secp256k1 wallets.

use sha3::{Digest as _, Keccak256};

use crate::types::Digest;

/// Compute the Keccak-256 hash of `data`.
///
/// # Example
///
/// ```
/// use lockbox_protocol::crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(hash[0], 0xc5);
/// ```
pub fn keccak256(data: &[u8]) -> Digest {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash several byte slices as if they were concatenated, without
/// allocating the concatenation.
pub fn keccak256_multi(parts: &[&[u8]]) -> Digest {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
