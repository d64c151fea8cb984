//! # Protocol Configuration & Constants
//!
//! Every magic number in Lockbox lives here. The signing domain and the
//! type strings below are part of what authorization keys sign: change one
//! and every outstanding signature in the wild stops verifying. Treat edits
//! here as a protocol version bump, because that's what they are.

// ---------------------------------------------------------------------------
// Signing Domain
// ---------------------------------------------------------------------------

/// Name bound into the typed-data domain separator.
pub const DOMAIN_NAME: &str = "Lockbox";

/// Domain version. Bump on any change to the operation encoding.
pub const DOMAIN_VERSION: &str = "1";

/// Chain id used when nothing else is configured.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Canonical type string of the signing domain.
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Canonical type string of the signed operation struct.
pub const OPERATION_TYPE: &str =
    "Operation(uint256 tokenId,uint256 nonce,uint8 opType,bytes32 dataHash)";

/// Two-byte prefix of the final typed-data digest.
pub const TYPED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// Account address length in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Keccak-256 output length in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// Width of one encoded parameter word.
pub const WORD_LENGTH: usize = 32;

/// Recoverable secp256k1 signature length: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Secret scalar length for authorization keys.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Offset added to the recovery id in the `v` byte, Ethereum style.
/// Both `{0, 1}` and `{27, 28}` are accepted on input.
pub const RECOVERY_ID_OFFSET: u8 = 27;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Basis-point denominator, used by fee-charging token fixtures.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Returns a friendly chain name for logging. Unknown chains get their id.
pub fn chain_name(chain_id: u64) -> String {
    match chain_id {
        1 => "mainnet".to_string(),
        11_155_111 => "sepolia".to_string(),
        31_337 => "local".to_string(),
        other => format!("chain-{}", other),
    }
}
