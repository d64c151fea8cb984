//! # Lockbox Contracts
//!
//! The Lockbox vault and the host chain it is deployed on.
//!
//! - **Chain**: native balances, fungible token contracts, item
//!   collections and swap routers, held in memory. Includes the awkward
//!   cases real chains have: fee-on-transfer tokens, accounts that refuse
//!   native payments, collections that lie about transfers.
//! - **Vault**: non-transferable lockbox tokens with a multi-asset ledger,
//!   holder-only deposits, and withdrawals, swaps, key rotation and burn
//!   gated by signed operations from a delegated authorization key.
//!
//! ## Design Principles
//!
//! 1. Amounts are checked everywhere. `checked_add` or an error, never
//!    wrapping.
//! 2. Deposits credit what arrived, not what was asked for.
//! 3. Every entry point is all-or-nothing, external effects included.
//! 4. External code is measured, never believed.

pub mod chain;
pub mod vault;

pub use chain::{Chain, ChainError};
pub use vault::{CallContext, LockboxStatus, LockboxSnapshot, LockboxVault, VaultError};
