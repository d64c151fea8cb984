//! # Cryptographic Primitives for Lockbox
//!
//! Everything signature-related flows through here:
//!
//! - **Keccak-256** for every digest, so signatures interoperate with
//!   standard secp256k1 wallets and hardware signers.
//! - **secp256k1 ECDSA** with public-key recovery for authorization keys.
//!   The vault stores an address, recovers the signer, compares.
//!
//! Everything here is a thin, typed wrapper around `k256` and `sha3`.
//! Nothing clever happens in this module, and that is the point.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{keccak256, keccak256_multi};
pub use keys::{address_from_verifying_key, AuthorizationKeypair, KeyError};
pub use signatures::{recover_signer, RecoverableSignature, SignatureError};
