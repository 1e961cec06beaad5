//! # quoin-ledger
//!
//! Conservation-checked value ledger for the Quoin protocol.
//!
//! The ledger tracks value registries ([`ledger::Supply`]) and per-account
//! value cells ([`ledger::Holder`]). Every cell is bound to exactly one
//! registry, and the registry total always equals the sum of its cells'
//! amounts. All mutation is gated by a single designated controller per
//! registry/cell, and every successful mutation appends an immutable
//! [`audit::AuditRecord`].
//!
//! ## Modules
//!
//! - [`ledger`] — Supply/Holder arena and the controller-gated operations
//! - [`audit`] — Append-only audit records

pub mod audit;
pub mod ledger;

pub use audit::{AuditOp, AuditRecord};
pub use ledger::{Holder, HolderId, Ledger, Supply, SupplyId};

use quoin_types::Amount;

/// Error types for ledger operations.
///
/// Every error implies the operation made no state change: preconditions
/// are checked in full before the first write.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The caller is not the designated controller of the registry/cell.
    #[error("caller is not the designated controller")]
    Unauthorized,

    /// The amount left the representable domain (arithmetic overflow).
    #[error("amount outside the representable range")]
    OutOfBounds,

    /// A burn or transfer exceeded the cell's balance.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount the operation required.
        required: Amount,
        /// Amount actually available in the cell.
        available: Amount,
    },

    /// Source and destination of a transfer are the same cell.
    #[error("source and destination are the same holder")]
    SelfTransfer,

    /// Source and destination cells belong to different registries.
    #[error("holders belong to different registries")]
    RegistryMismatch,

    /// The supply handle does not name a known registry.
    #[error("unknown supply registry")]
    UnknownSupply,

    /// The holder handle does not name a known cell.
    #[error("unknown holder cell")]
    UnknownHolder,
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
