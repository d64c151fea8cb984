//! # Authorization Keys
//!
//! secp256k1 keypairs for the delegated signer of a lockbox.
//!
//! A lockbox does not trust its holder's identity to move funds. It trusts
//! the *address* of an authorization key, and a fund-moving call only goes
//! through if the signature over the operation recovers to that address.
//! That's what lets a cold holder account hand day-to-day signing to a hot
//! automation key without handing over the vault.
//!
//! ## Security considerations
//!
//! - Secret scalars come from `OsRng` unless a caller explicitly supplies a
//!   seed (tests, deterministic tooling).
//! - Key bytes are never logged, and `Debug` prints only the address.

use std::fmt;

use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use super::hash::keccak256;
use super::signatures::RecoverableSignature;
use crate::config::{ADDRESS_LENGTH, SECRET_KEY_LENGTH};
use crate::types::{Address, Digest};

/// Errors that can occur during key operations.
///
/// Terse. Error messages are not a place for key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("signing failed")]
    SigningFailed,
}

/// The delegated signing key of a lockbox.
pub struct AuthorizationKeypair {
    signing_key: SigningKey,
}

impl AuthorizationKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Rebuild a keypair from a 32-byte secret scalar.
    ///
    /// Fails for zero and for scalars not below the curve order.
    pub fn from_secret_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Parse a hex-encoded secret (with or without `0x`).
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_secret_bytes(&arr)
    }

    /// The address a lockbox stores as its authorization key.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest, producing an `r || s || v` signature.
    ///
    /// The digest is signed as-is; callers hand in the typed-data digest
    /// from [`crate::operation::Domain::digest`].
    pub fn sign_digest(&self, digest: &Digest) -> Result<RecoverableSignature, KeyError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|_| KeyError::SigningFailed)?;
        Ok(RecoverableSignature::from_parts(&signature, recovery_id))
    }

    /// Export the raw secret scalar. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes().into()
    }

    pub fn secret_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.secret_key_bytes()))
    }
}

impl Clone for AuthorizationKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
        }
    }
}

impl fmt::Debug for AuthorizationKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorizationKeypair(address={})", self.address())
    }
}

/// Derive the account address of a secp256k1 public key:
/// the last 20 bytes of `keccak256(x || y)`.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Uncompressed SEC1 points start with the 0x04 tag byte.
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut bytes = [0u8; ADDRESS_LENGTH];
    bytes.copy_from_slice(&hash[hash.len() - ADDRESS_LENGTH..]);
    Address::from_bytes(bytes)
}
