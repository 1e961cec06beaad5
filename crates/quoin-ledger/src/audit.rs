//! Append-only audit records for ledger mutations.
//!
//! Every successful mutating operation — value mutations and controller
//! reassignments alike — appends one record with its exact arguments and
//! the resulting balances. Records are never modified or removed; external
//! auditors and indexers consume them as an ordered stream.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use quoin_types::{Account, Amount};

use crate::ledger::{HolderId, SupplyId};

/// The operation recorded by an [`AuditRecord`], with its exact arguments.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOp {
    /// Fresh value created into a cell.
    Mint {
        /// The credited cell.
        holder: HolderId,
        /// Amount created.
        amount: Amount,
    },
    /// Value destroyed from a cell.
    Burn {
        /// The debited cell.
        holder: HolderId,
        /// Amount destroyed.
        amount: Amount,
    },
    /// Value moved between two cells of the same registry.
    Transfer {
        /// Source cell.
        src: HolderId,
        /// Destination cell.
        dst: HolderId,
        /// Amount moved.
        amount: Amount,
    },
    /// Cell controller reassigned.
    SetController {
        /// The cell whose controller changed.
        holder: HolderId,
        /// The new controller.
        #[serde_as(as = "serde_with::hex::Hex")]
        new_controller: Account,
    },
    /// Registry controller reassigned.
    DelegateRegistry {
        /// The registry whose controller changed.
        registry: SupplyId,
        /// The new controller.
        #[serde_as(as = "serde_with::hex::Hex")]
        new_controller: Account,
    },
}

/// One immutable entry in the ledger's audit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Strictly increasing sequence number (position in the log).
    pub seq: u64,
    /// The operation and its arguments.
    pub op: AuditOp,
    /// Balance of the touched cell after the operation
    /// (the source cell, for transfers).
    pub resulting_amount: Amount,
    /// Total of the cell's registry after the operation.
    pub resulting_total: Amount,
}
