//! # quoin-types
//!
//! Shared domain types used across the Quoin workspace.
//!
//! Quoin is a decentralized price-consensus oracle: stakers agree, epoch by
//! epoch, on a single discrete level via commit-reveal voting, with deposits
//! escrowed on a conservation-checked value ledger. These aliases are the
//! vocabulary every crate in the workspace speaks.

use serde::{Deserialize, Serialize};

/// An account identity (32 bytes, conventionally a public-key hash).
pub type Account = [u8; 32];

/// An opaque 32-byte digest, e.g. a vote commitment.
pub type Digest = [u8; 32];

/// A value amount in base units. Non-negative by construction.
pub type Amount = u64;

/// A discrete price level. Valid levels are `0..level_max`; the value
/// `level_max` itself is the no-consensus sentinel.
pub type LevelIndex = u32;

/// A voter-chosen blinding nonce for a vote commitment.
pub type Nonce = u64;

/// A monotonically increasing phase counter. Never resets.
pub type PhaseId = u64;

/// The role a phase slot plays during the current phase.
///
/// Each slot cycles commit -> reveal -> reclaim as the phase counter
/// advances, then is drained and reused for the next commit window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseRole {
    /// The slot is accepting new commitments.
    Commit,
    /// The slot is accepting reveals of last phase's commitments.
    Reveal,
    /// The slot is settled; correct voters may reclaim deposits/rewards.
    Reclaim,
}
