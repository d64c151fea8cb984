//! # Core Value Types
//!
//! The small, copyable values that every other module passes around:
//! account addresses, lockbox and item identifiers, caller reference tags,
//! and the asset selectors used by the swap engine.
//!
//! Amounts are plain `u128` in the asset's smallest unit. Nothing in the
//! protocol divides an amount except the fee maths in test fixtures, so
//! there is no fixed-point type here and there never should be.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{ADDRESS_LENGTH, DIGEST_LENGTH};

/// Quantity of an asset in its smallest unit.
pub type Amount = u128;

/// Identifier of a lockbox (the vault token id).
pub type LockboxId = u64;

/// Identifier of a non-fungible item inside its collection.
pub type ItemId = u128;

/// A 32-byte Keccak-256 digest.
pub type Digest = [u8; DIGEST_LENGTH];

/// Errors produced when parsing textual identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("wrong length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(ParseError::WrongLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address.
///
/// Holders, authorization keys, token contracts, collections, routers and
/// the vault itself are all addressed the same way. Authorization keys are
/// the Keccak-derived address of a secp256k1 public key (see
/// [`crate::crypto::keys`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Never a valid holder, key, or recipient.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds a readable test/demo address whose last byte is `tag`.
    pub const fn from_low_u64(tag: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        let tag_bytes = tag.to_be_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[ADDRESS_LENGTH - 8 + i] = tag_bytes[i];
            i += 1;
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<ADDRESS_LENGTH>(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ReferenceId
// ---------------------------------------------------------------------------

/// Opaque caller correlation tag.
///
/// Bound into every signed operation but otherwise meaningless to the vault.
/// Off-chain systems use it to match submitted calls to their own records.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReferenceId([u8; DIGEST_LENGTH]);

impl ReferenceId {
    pub const fn from_bytes(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// A fresh random tag: a v4 UUID in the leading 16 bytes, zero padded.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        let mut bytes = [0u8; DIGEST_LENGTH];
        bytes[..16].copy_from_slice(uuid.as_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for ReferenceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<DIGEST_LENGTH>(s).map(Self)
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceId({})", &self.to_hex()[..18])
    }
}

impl Serialize for ReferenceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ReferenceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Asset selectors
// ---------------------------------------------------------------------------

/// One side of a swap: the native currency or a fungible token contract.
///
/// On the signing wire the native currency is encoded as the zero address,
/// which is why [`SwapAsset::token`] refuses to wrap [`Address::ZERO`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapAsset {
    Native,
    Token(Address),
}

impl SwapAsset {
    /// Wraps a token address, mapping the zero address to `Native`.
    pub fn token(address: Address) -> Self {
        if address.is_zero() {
            SwapAsset::Native
        } else {
            SwapAsset::Token(address)
        }
    }

    /// The address used for this asset in signed parameter encodings.
    pub fn wire_address(&self) -> Address {
        match self {
            SwapAsset::Native => Address::ZERO,
            SwapAsset::Token(address) => *address,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, SwapAsset::Native)
    }
}

/// Where swap output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapRecipient {
    /// Credit the output back into the lockbox ledger.
    Lockbox,
    /// Forward the output to an external account; the ledger is untouched.
    External(Address),
}

impl SwapRecipient {
    /// Wire encoding: the lockbox is the zero address.
    pub fn wire_address(&self) -> Address {
        match self {
            SwapRecipient::Lockbox => Address::ZERO,
            SwapRecipient::External(address) => *address,
        }
    }
}

/// A non-fungible item, identified by its collection and id.
///
/// Different collections routinely reuse the same numeric ids, so the pair
/// is the only meaningful key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub collection: Address,
    pub item_id: ItemId,
}

impl ItemKey {
    pub fn new(collection: Address, item_id: ItemId) -> Self {
        Self {
            collection,
            item_id,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.item_id)
    }
}
