//! Vault error taxonomy.
//!
//! Every variant belongs to exactly one [`ErrorClass`]. Callers that only
//! care about the class (retry the signature? fix the input? give up?) can
//! match on [`VaultError::class`] instead of every variant.

use thiserror::Error;

use lockbox_protocol::types::{Address, Amount, ItemKey, LockboxId};

use crate::chain::ChainError;

/// Coarse grouping of vault failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The signed operation does not authorize this call.
    Authorization,
    /// The call is malformed regardless of state.
    InputValidation,
    /// The call is well formed but the vault state forbids it.
    State,
    /// An external contract or router misbehaved.
    ExternalInteraction,
}

/// Errors returned by vault entry points. Any error means the call had no
/// effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    // -- Authorization ------------------------------------------------------
    /// The operation's expiry is in the past.
    #[error("signature expired at {expiry}, chain time is {now}")]
    SignatureExpired { expiry: u64, now: u64 },

    /// The envelope was signed for a different nonce.
    #[error("stale nonce: lockbox is at {expected}, operation carries {provided}")]
    StaleNonce { expected: u64, provided: u64 },

    /// The supplied struct hash does not match the rebuilt one.
    #[error("struct hash does not match the submitted parameters")]
    StructHashMismatch,

    /// The signature does not recover to the lockbox's authorization key.
    #[error("signature does not recover to the authorization key")]
    InvalidSignature,

    // -- Input validation ---------------------------------------------------
    #[error("zero address")]
    ZeroAddress,

    #[error("zero amount")]
    ZeroAmount,

    #[error("zero authorization key")]
    ZeroKey,

    /// Parallel arrays disagree in length.
    #[error("length mismatch: {what} ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("swap input and output are the same asset")]
    SameTokenSwap,

    #[error("{0} cannot receive assets")]
    InvalidRecipient(Address),

    /// Declared native amount differs from value attached to the call.
    #[error("native amount {declared} does not match attached value {sent}")]
    NativeAmountMismatch { declared: Amount, sent: Amount },

    /// A lockbox can only be minted to the caller.
    #[error("lockboxes can only be minted to the caller")]
    SelfMintOnly,

    /// Value attached to a call that does not take value.
    #[error("call does not accept native value ({0} attached)")]
    UnexpectedValue(Amount),

    // -- State --------------------------------------------------------------
    #[error("lockbox {0} does not exist")]
    NonexistentLockbox(LockboxId),

    #[error("{caller} is not the holder of lockbox {lockbox_id}")]
    NotHolder {
        lockbox_id: LockboxId,
        caller: Address,
    },

    #[error("lockbox holds {available} native, requested {requested}")]
    InsufficientNativeBalance { available: Amount, requested: Amount },

    #[error("lockbox holds {available} of {token}, requested {requested}")]
    InsufficientTokenBalance {
        token: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("item {0} is not in the lockbox")]
    ItemNotFound(ItemKey),

    #[error("lockbox {0} still holds assets")]
    LedgerNotEmpty(LockboxId),

    /// Lockboxes are soulbound.
    #[error("lockbox transfers are disabled")]
    TransfersDisabled,

    #[error("only the vault admin may do this")]
    NotAdmin,

    #[error("default metadata URI is already set")]
    DefaultMetadataUriAlreadySet,

    #[error("no metadata URI for lockbox {0}")]
    MissingMetadataUri(LockboxId),

    #[error("amount overflow")]
    AmountOverflow,

    // -- External interaction -----------------------------------------------
    #[error("{0} rejected the native transfer")]
    NativeTransferRejected(Address),

    #[error("swap call failed: {0}")]
    SwapCallFailed(String),

    /// The router consumed more input than it was allowed.
    #[error("router spent {spent}, allowed {allowed}")]
    RouterOverspent { allowed: Amount, spent: Amount },

    /// The router left part of the debited input in the vault.
    #[error("router spent {spent}, expected {expected}")]
    RouterUnderspent { expected: Amount, spent: Amount },

    #[error("swap returned {received}, minimum was {minimum}")]
    SlippageExceeded { minimum: Amount, received: Amount },

    /// The collection reported success but the vault does not own the item.
    #[error("item {0} was not received")]
    ItemNotReceived(ItemKey),

    /// Any other host-chain failure (missing allowance, unknown token, ...).
    #[error("external call failed: {0}")]
    External(ChainError),
}

impl VaultError {
    pub fn class(&self) -> ErrorClass {
        use VaultError::*;
        match self {
            SignatureExpired { .. } | StaleNonce { .. } | StructHashMismatch | InvalidSignature => {
                ErrorClass::Authorization
            }
            ZeroAddress
            | ZeroAmount
            | ZeroKey
            | LengthMismatch { .. }
            | DuplicateEntry(_)
            | SameTokenSwap
            | InvalidRecipient(_)
            | NativeAmountMismatch { .. }
            | SelfMintOnly
            | UnexpectedValue(_) => ErrorClass::InputValidation,
            NonexistentLockbox(_)
            | NotHolder { .. }
            | InsufficientNativeBalance { .. }
            | InsufficientTokenBalance { .. }
            | ItemNotFound(_)
            | LedgerNotEmpty(_)
            | TransfersDisabled
            | NotAdmin
            | DefaultMetadataUriAlreadySet
            | MissingMetadataUri(_)
            | AmountOverflow => ErrorClass::State,
            NativeTransferRejected(_)
            | SwapCallFailed(_)
            | RouterOverspent { .. }
            | RouterUnderspent { .. }
            | SlippageExceeded { .. }
            | ItemNotReceived(_)
            | External(_) => ErrorClass::ExternalInteraction,
        }
    }
}

impl From<ChainError> for VaultError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NativeTransferRejected(to) => VaultError::NativeTransferRejected(to),
            other => VaultError::External(other),
        }
    }
}
