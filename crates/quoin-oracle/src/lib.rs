//! # quoin-oracle
//!
//! Commit-reveal price-level consensus for the Quoin protocol.
//!
//! Stakers agree, phase by phase, on a single discrete level. Each voter
//! commits a hidden vote with a locked deposit, reveals it one phase later,
//! and reclaims its deposit (plus a reward for voting with the consensus)
//! the phase after that. The three windows are implemented as a 3-slot ring
//! buffer over the phase counter; deposits are escrowed on the
//! [`quoin_ledger`] value ledger and never leave the oracle's control
//! between commit and settlement.
//!
//! ## Modules
//!
//! - [`config`] — Validated oracle parameters
//! - [`histogram`] — Deposit-weighted level histogram and mode computation
//! - [`oracle`] — The phase state machine: commit, reveal, advance, reclaim
//! - [`audit`] — Append-only oracle audit records

pub mod audit;
pub mod config;
pub mod histogram;
pub mod oracle;

pub use audit::{OracleEvent, OracleRecord};
pub use config::OracleConfig;
pub use histogram::LevelHistogram;
pub use oracle::{Blake3Hasher, Commitment, CommitmentHasher, Oracle, PhaseAdvance, GENESIS_PHASE};

use quoin_types::Amount;

/// Error types for oracle operations.
///
/// Soft outcomes of the voting protocol — duplicate commitments, unmatched
/// reveals, already-settled reclaims — are reported through `Ok(false)` /
/// `Ok(0)` return values, not through this enum.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// An underlying ledger operation failed.
    #[error("ledger operation failed: {0}")]
    Ledger(#[from] quoin_ledger::LedgerError),

    /// The oracle configuration is invalid.
    #[error("invalid oracle config: {0}")]
    InvalidConfig(String),

    /// The funding cell's balance does not match the declared deposit.
    #[error("escrow balance mismatch: expected {expected}, actual {actual}")]
    EscrowMismatch {
        /// The deposit declared by the commit call.
        expected: Amount,
        /// The balance actually present in the funding cell.
        actual: Amount,
    },

    /// The settlement arithmetic violated the conservation law.
    /// Unreachable when the ledger's own invariants hold.
    #[error("conservation violation: expected {expected}, actual {actual}")]
    ConservationViolation {
        /// `deposit_total + mint_amount`.
        expected: Amount,
        /// `deposit_to_reclaim + reward_total`.
        actual: Amount,
    },
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
