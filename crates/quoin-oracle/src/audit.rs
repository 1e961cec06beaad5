//! Append-only audit records for oracle operations.
//!
//! Every mutating oracle operation — commit, reveal, phase advance,
//! reclaim — appends one record with its exact arguments and resulting
//! amounts. Soft rejections (duplicate commits, unmatched reveals,
//! already-settled reclaims) change no state and are not recorded.
//! Ledger-level effects (escrow transfers, reward minting, remainder
//! burning) additionally appear in the ledger's own audit log.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use quoin_types::{Account, Amount, Digest, LevelIndex, Nonce, PhaseId};

/// The oracle operation recorded by an [`OracleRecord`].
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    /// A commitment was accepted into the commit slot.
    Commit {
        /// The committing voter.
        #[serde_as(as = "serde_with::hex::Hex")]
        account: Account,
        /// The opaque commitment digest.
        #[serde_as(as = "serde_with::hex::Hex")]
        digest: Digest,
        /// The escrowed deposit.
        deposit: Amount,
    },
    /// A reveal was attached to a pending commitment.
    Reveal {
        /// The revealing voter.
        #[serde_as(as = "serde_with::hex::Hex")]
        account: Account,
        /// The disclosed level.
        level: LevelIndex,
        /// The disclosed blinding nonce.
        salt: Nonce,
        /// Whether the disclosure matched the commitment digest and range.
        correct: bool,
    },
    /// The phase boundary was crossed.
    PhaseAdvance {
        /// Consensus level of the slot that just settled
        /// (`level_max` sentinel when nobody revealed correctly).
        mode_level: LevelIndex,
        /// Reward pool of the settled slot.
        reward_total: Amount,
        /// Fresh value minted into the reward pool.
        minted: Amount,
        /// Escrow remainder burned from the vacated slot.
        reclaimed: Amount,
    },
    /// A voter settled its commitment in the reclaim slot.
    Reclaim {
        /// The settling voter.
        #[serde_as(as = "serde_with::hex::Hex")]
        account: Account,
        /// The amount paid out (principal, possibly plus reward).
        payout: Amount,
    },
}

/// One immutable entry in the oracle's audit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRecord {
    /// Strictly increasing sequence number (position in the log).
    pub seq: u64,
    /// The phase during which the operation ran. For `PhaseAdvance`
    /// records this is the phase being entered.
    pub phase_id: PhaseId,
    /// The operation and its arguments.
    pub event: OracleEvent,
}
