//! Typed-data domain separation and the signed `Operation` struct.
//!
//! The final digest an authorization key signs is
//!
//! ```text
//! keccak256(0x19 0x01 || domainSeparator || structHash)
//! structHash = keccak256(OPERATION_TYPEHASH || lockboxId || nonce || opType || dataHash)
//! ```
//!
//! The domain pins a signature to one vault deployment on one chain. The
//! nonce pins it to one point in the lockbox's history.

use serde::{Deserialize, Serialize};

use super::encoding::WordEncoder;
use super::params::OperationType;
use crate::config::{
    DEFAULT_CHAIN_ID, DOMAIN_NAME, DOMAIN_TYPE, DOMAIN_VERSION, OPERATION_TYPE, TYPED_DATA_PREFIX,
};
use crate::crypto::hash::{keccak256, keccak256_multi};
use crate::types::{Address, Digest, LockboxId};

/// The signing domain of one vault deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Domain {
    /// Domain with the protocol's default name and version.
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn separator(&self) -> Digest {
        WordEncoder::new()
            .word(&keccak256(DOMAIN_TYPE.as_bytes()))
            .bytes(self.name.as_bytes())
            .bytes(self.version.as_bytes())
            .uint64(self.chain_id)
            .address(&self.verifying_contract)
            .hash()
    }

    /// The digest actually signed for a given struct hash.
    pub fn digest(&self, struct_hash: &Digest) -> Digest {
        let separator = self.separator();
        keccak256_multi(&[&TYPED_DATA_PREFIX[..], &separator[..], &struct_hash[..]])
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID, Address::ZERO)
    }
}

/// `keccak256` of the operation type string.
pub fn operation_typehash() -> Digest {
    keccak256(OPERATION_TYPE.as_bytes())
}

/// The fixed-size signed message.
///
/// Built off-chain by the key holder, rebuilt by the vault from its own
/// state (current nonce) and the submitted parameters, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub lockbox_id: LockboxId,
    pub nonce: u64,
    pub operation_type: OperationType,
    pub data_hash: Digest,
}

impl Operation {
    pub fn struct_hash(&self) -> Digest {
        WordEncoder::new()
            .word(&operation_typehash())
            .uint64(self.lockbox_id)
            .uint64(self.nonce)
            .uint(u128::from(self.operation_type.as_u8()))
            .word(&self.data_hash)
            .hash()
    }

    pub fn signing_digest(&self, domain: &Domain) -> Digest {
        domain.digest(&self.struct_hash())
    }
}
