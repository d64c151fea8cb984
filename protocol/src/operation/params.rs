//! Operation types and their parameter tuples.
//!
//! The signed struct is small and fixed (`lockbox id, nonce, op type,
//! data hash`); the parameters live behind `data_hash`. Whatever the
//! authorization key signs, the vault recomputes from the parameters it is
//! actually about to execute. A valid signature over different parameters
//! is worthless.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::encoding::WordEncoder;
use crate::types::{Address, Amount, Digest, ItemId, ReferenceId, SwapAsset, SwapRecipient};

/// Discriminant of every authorized operation.
///
/// The numeric values are part of the signed struct. Do not reorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OperationType {
    RotateKey = 0,
    WithdrawNative = 1,
    WithdrawToken = 2,
    WithdrawItem = 3,
    Burn = 4,
    SetMetadataUri = 5,
    BatchWithdraw = 6,
    Swap = 7,
}

impl OperationType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => OperationType::RotateKey,
            1 => OperationType::WithdrawNative,
            2 => OperationType::WithdrawToken,
            3 => OperationType::WithdrawItem,
            4 => OperationType::Burn,
            5 => OperationType::SetMetadataUri,
            6 => OperationType::BatchWithdraw,
            7 => OperationType::Swap,
            _ => return None,
        })
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationType::RotateKey => "rotate-key",
            OperationType::WithdrawNative => "withdraw-native",
            OperationType::WithdrawToken => "withdraw-token",
            OperationType::WithdrawItem => "withdraw-item",
            OperationType::Burn => "burn",
            OperationType::SetMetadataUri => "set-metadata-uri",
            OperationType::BatchWithdraw => "batch-withdraw",
            OperationType::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// Parameters of a batch withdrawal. Parallel arrays, as submitted.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchWithdrawal {
    pub native_amount: Amount,
    pub tokens: Vec<Address>,
    pub amounts: Vec<Amount>,
    pub collections: Vec<Address>,
    pub item_ids: Vec<ItemId>,
    pub recipient: Address,
}

/// Parameters of a swap through an external router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub token_in: SwapAsset,
    pub token_out: SwapAsset,
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    pub router: Address,
    /// Opaque call data handed to the router verbatim.
    #[serde(with = "hex_bytes")]
    pub call_data: Vec<u8>,
    pub recipient: SwapRecipient,
}

/// The operation-specific parameter tuple of an authorized call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationParams {
    RotateKey {
        new_key: Address,
    },
    WithdrawNative {
        amount: Amount,
        recipient: Address,
    },
    WithdrawToken {
        token: Address,
        amount: Amount,
        recipient: Address,
    },
    WithdrawItem {
        collection: Address,
        item_id: ItemId,
        recipient: Address,
    },
    Burn,
    SetMetadataUri {
        uri: String,
    },
    BatchWithdraw(BatchWithdrawal),
    Swap(SwapRequest),
}

/// Context values bound into every parameter hash alongside the parameters.
///
/// Binding the caller means a signature issued for one holder cannot be
/// submitted by another; binding the expiry means the deadline the vault
/// enforces is the deadline the key actually signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBinding {
    pub reference_id: ReferenceId,
    pub caller: Address,
    /// Unix seconds after which the signature is dead.
    pub expiry: u64,
}

impl OperationParams {
    pub fn operation_type(&self) -> OperationType {
        match self {
            OperationParams::RotateKey { .. } => OperationType::RotateKey,
            OperationParams::WithdrawNative { .. } => OperationType::WithdrawNative,
            OperationParams::WithdrawToken { .. } => OperationType::WithdrawToken,
            OperationParams::WithdrawItem { .. } => OperationType::WithdrawItem,
            OperationParams::Burn => OperationType::Burn,
            OperationParams::SetMetadataUri { .. } => OperationType::SetMetadataUri,
            OperationParams::BatchWithdraw(_) => OperationType::BatchWithdraw,
            OperationParams::Swap(_) => OperationType::Swap,
        }
    }

    /// Word-encode the parameters followed by the binding.
    pub fn encode(&self, binding: &OperationBinding) -> Vec<u8> {
        let enc = WordEncoder::new();
        let enc = match self {
            OperationParams::RotateKey { new_key } => enc.address(new_key),
            OperationParams::WithdrawNative { amount, recipient } => {
                enc.uint(*amount).address(recipient)
            }
            OperationParams::WithdrawToken {
                token,
                amount,
                recipient,
            } => enc.address(token).uint(*amount).address(recipient),
            OperationParams::WithdrawItem {
                collection,
                item_id,
                recipient,
            } => enc.address(collection).uint(*item_id).address(recipient),
            OperationParams::Burn => enc,
            OperationParams::SetMetadataUri { uri } => enc.bytes(uri.as_bytes()),
            OperationParams::BatchWithdraw(batch) => enc
                .uint(batch.native_amount)
                .address_array(&batch.tokens)
                .uint_array(&batch.amounts)
                .address_array(&batch.collections)
                .uint_array(&batch.item_ids)
                .address(&batch.recipient),
            OperationParams::Swap(swap) => enc
                .address(&swap.token_in.wire_address())
                .address(&swap.token_out.wire_address())
                .uint(swap.amount_in)
                .uint(swap.min_amount_out)
                .address(&swap.router)
                .bytes(&swap.call_data)
                .address(&swap.recipient.wire_address()),
        };
        enc.word(binding.reference_id.as_bytes())
            .address(&binding.caller)
            .uint64(binding.expiry)
            .finish()
    }

    /// `keccak256(encode(params, binding))`, the `dataHash` of the signed struct.
    pub fn data_hash(&self, binding: &OperationBinding) -> Digest {
        crate::crypto::keccak256(&self.encode(binding))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(stripped).map_err(serde::de::Error::custom)
    }
}
