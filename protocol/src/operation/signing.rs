//! Off-chain signing of operations.
//!
//! The authorization-key holder builds the same [`Operation`] the vault
//! will rebuild, signs its typed-data digest, and hands the result to the
//! vault holder as a [`SignedOperation`]. The holder submits it together
//! with the plain parameters; the envelope itself carries no parameters.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::params::{OperationBinding, OperationParams};
use super::typed_data::{Domain, Operation};
use crate::crypto::keys::{AuthorizationKeypair, KeyError};
use crate::crypto::signatures::RecoverableSignature;
use crate::types::{Address, Digest, LockboxId, ReferenceId};

/// What the holder submits with every authorized call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOperation {
    /// Nonce the operation was signed against.
    pub nonce: u64,
    /// Struct hash the signer committed to.
    #[serde(with = "hex_digest")]
    pub struct_hash: Digest,
    pub signature: RecoverableSignature,
    pub reference_id: ReferenceId,
    /// Unix seconds.
    pub expiry: u64,
}

impl SignedOperation {
    /// Expiry as a timestamp, for display. `None` if out of chrono's range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.expiry).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    pub fn is_expired_at(&self, now_unix: u64) -> bool {
        now_unix > self.expiry
    }
}

/// Everything the signer needs besides the key and the parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    pub lockbox_id: LockboxId,
    pub nonce: u64,
    pub caller: Address,
    pub reference_id: ReferenceId,
    pub expiry: u64,
}

/// Build the [`Operation`] for `params` under `request`.
pub fn build_operation(request: &SigningRequest, params: &OperationParams) -> Operation {
    let binding = OperationBinding {
        reference_id: request.reference_id,
        caller: request.caller,
        expiry: request.expiry,
    };
    Operation {
        lockbox_id: request.lockbox_id,
        nonce: request.nonce,
        operation_type: params.operation_type(),
        data_hash: params.data_hash(&binding),
    }
}

/// Sign `params` for submission by `request.caller`.
///
/// # Example
///
/// ```
/// use lockbox_protocol::crypto::AuthorizationKeypair;
/// use lockbox_protocol::operation::{sign_operation, Domain, OperationParams, SigningRequest};
/// use lockbox_protocol::types::{Address, ReferenceId};
///
/// let key = AuthorizationKeypair::generate();
/// let domain = Domain::new(1, Address::from_low_u64(0x1000));
/// let request = SigningRequest {
///     lockbox_id: 0,
///     nonce: 1,
///     caller: Address::from_low_u64(0xA11CE),
///     reference_id: ReferenceId::random(),
///     expiry: 4_000_000_000,
/// };
/// let signed = sign_operation(&key, &domain, &request, &OperationParams::Burn).unwrap();
/// assert_eq!(signed.nonce, 1);
/// ```
pub fn sign_operation(
    key: &AuthorizationKeypair,
    domain: &Domain,
    request: &SigningRequest,
    params: &OperationParams,
) -> Result<SignedOperation, KeyError> {
    let operation = build_operation(request, params);
    let struct_hash = operation.struct_hash();
    let signature = key.sign_digest(&domain.digest(&struct_hash))?;

    tracing::debug!(
        lockbox_id = request.lockbox_id,
        nonce = request.nonce,
        operation = %operation.operation_type,
        "operation signed"
    );

    Ok(SignedOperation {
        nonce: request.nonce,
        struct_hash,
        signature,
        reference_id: request.reference_id,
        expiry: request.expiry,
    })
}

mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::Digest;

    pub fn serialize<S: Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(digest)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Digest, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| serde::de::Error::custom("digest must be 32 bytes"))
    }
}
