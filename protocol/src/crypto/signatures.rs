//! # Recoverable Signatures
//!
//! secp256k1 ECDSA signatures in the 65-byte `r || s || v` layout, and the
//! recovery routine that turns one back into a signer address.
//!
//! Verification in Lockbox is recovery, not "verify against a known public
//! key": the vault stores only the authorization key's *address*, recovers
//! the signer from the digest, and compares addresses.
//!
//! ## Malleability
//!
//! For every valid `(r, s)` the pair `(r, n - s)` is also valid. We accept
//! only the low-`s` form, so a signature has exactly one byte encoding.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::keys::address_from_verifying_key;
use crate::config::{RECOVERY_ID_OFFSET, SIGNATURE_LENGTH};
use crate::types::{Address, Digest};

/// Errors during signature parsing or recovery.
///
/// The vault reports "wrong signer" the same way
/// whether recovery failed or produced someone else's address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature bytes: expected {SIGNATURE_LENGTH} bytes")]
    InvalidLength,

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("malformed signature scalars")]
    MalformedScalars,

    #[error("non-canonical signature: high s value")]
    HighS,

    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// A 65-byte recoverable signature.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    bytes: [u8; SIGNATURE_LENGTH],
}

impl RecoverableSignature {
    pub(crate) fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte() + RECOVERY_ID_OFFSET;
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    pub fn try_from_slice(slice: &[u8]) -> Result<Self, SignatureError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            slice.try_into().map_err(|_| SignatureError::InvalidLength)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| SignatureError::InvalidLength)?;
        Self::try_from_slice(&bytes)
    }

    /// Recover the signer address of `digest`.
    pub fn recover(&self, digest: &Digest) -> Result<Address, SignatureError> {
        recover_signer(digest, self)
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({}…)", &self.to_hex()[..18])
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let normalized = if v >= RECOVERY_ID_OFFSET {
        v - RECOVERY_ID_OFFSET
    } else {
        v
    };
    // Only the y-parity bit is meaningful; x-reduced ids never occur in practice.
    if normalized > 1 {
        return Err(SignatureError::InvalidRecoveryId(v));
    }
    RecoveryId::from_byte(normalized).ok_or(SignatureError::InvalidRecoveryId(v))
}

/// Recover the address that signed `digest`.
///
/// Rejects malformed scalars, high-`s` signatures, and out-of-range
/// recovery ids before attempting recovery.
pub fn recover_signer(
    digest: &Digest,
    signature: &RecoverableSignature,
) -> Result<Address, SignatureError> {
    let bytes = signature.as_bytes();
    let recovery_id = parse_recovery_id(bytes[64])?;

    let sig = Signature::from_slice(&bytes[..64]).map_err(|_| SignatureError::MalformedScalars)?;
    if sig.normalize_s().is_some() {
        return Err(SignatureError::HighS);
    }

    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_verifying_key(&key))
}
