//! # Signed Operations
//!
//! The replay-safe instruction format for everything that moves value out
//! of a lockbox or changes who may sign for it.
//!
//! ```text
//! encoding.rs  : word-aligned parameter encoding
//! params.rs    : operation types, parameter tuples, caller binding
//! typed_data.rs: signing domain, Operation struct, digests
//! signing.rs   : off-chain signer and the SignedOperation envelope
//! ```
//!
//! An operation is valid for exactly one lockbox, one nonce, one caller,
//! one parameter tuple, and one vault deployment, and only until its expiry.

pub mod encoding;
pub mod params;
pub mod signing;
pub mod typed_data;

pub use encoding::WordEncoder;
pub use params::{
    BatchWithdrawal, OperationBinding, OperationParams, OperationType, SwapRequest,
};
pub use signing::{build_operation, sign_operation, SignedOperation, SigningRequest};
pub use typed_data::{operation_typehash, Domain, Operation};
