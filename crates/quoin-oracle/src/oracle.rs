//! The three-phase commit-reveal state machine.
//!
//! Three phase slots rotate through the roles commit -> reveal -> reclaim
//! as the phase counter advances; slot `k` serves phase `p` in the role
//! given by `(p - k) mod 3`. A voter's deposit enters the slot's escrow
//! cell at commit time and leaves it only through [`Oracle::reclaim`] or
//! the remainder burn when the slot is vacated for reuse — the ring buffer
//! rotating past an unrevealed or unreclaimed commitment is the protocol's
//! only forfeiture mechanism.
//!
//! ## Conservation
//!
//! Every [`Oracle::advance_phase`] enforces
//!
//! ```text
//! deposit_to_reclaim + reward_total == deposit_total + mint_amount
//! ```
//!
//! for the settling slot: nothing deposited or minted is lost or
//! duplicated.
//!
//! ## Authority
//!
//! The oracle account must control the three escrow cells (created here)
//! and the value registry itself: `advance_phase` mints the reward
//! injection and burns vacated remainders under that authority. The driver
//! creates the registry with the oracle as controller, or delegates
//! control before the first phase boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quoin_crypto::blake3;
use quoin_ledger::{HolderId, Ledger, LedgerError, SupplyId};
use quoin_types::{Account, Amount, Digest, LevelIndex, Nonce, PhaseId, PhaseRole};

use crate::audit::{OracleEvent, OracleRecord};
use crate::config::OracleConfig;
use crate::histogram::LevelHistogram;
use crate::{OracleError, Result};

/// The phase counter's starting value. Starting past zero keeps the
/// reveal (`-1`) and reclaim (`-2`) slot indices addressable from the
/// first phase.
pub const GENESIS_PHASE: PhaseId = 3;

/// The digest capability used to verify reveals against commitments.
///
/// The protocol depends only on pre-image resistance of this function;
/// any collision-resistant hash can stand in for the default.
pub trait CommitmentHasher: Send + Sync {
    /// Compute the commitment digest for `(account, level, salt)`.
    fn digest(&self, account: &Account, level: LevelIndex, salt: Nonce) -> Digest;
}

/// The reference hasher: domain-separated BLAKE3 over the length-prefixed
/// encoding of `(account, level, salt)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl CommitmentHasher for Blake3Hasher {
    fn digest(&self, account: &Account, level: LevelIndex, salt: Nonce) -> Digest {
        blake3::vote_commitment(account, level, salt)
    }
}

/// One voter's hidden vote, bound to its escrowed deposit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// The opaque commitment digest supplied at commit time.
    pub digest: Digest,
    /// The deposit escrowed with the commitment.
    pub deposit: Amount,
    /// Whether a reveal (correct or not) was attached.
    pub revealed: bool,
    /// Whether the reveal matched the digest and the level range.
    pub revealed_correctly: bool,
    /// The revealed level. Meaningful only when `revealed_correctly`.
    pub level: LevelIndex,
    /// Whether the commitment's settlement has been consumed.
    pub reclaimed: bool,
}

/// One slot of the 3-element ring buffer.
#[derive(Debug)]
struct PhaseSlot {
    commitments: BTreeMap<Account, Commitment>,
    escrow: HolderId,
    deposit_total: Amount,
    // Settlement state, written when the slot's reveal window closes.
    mode_level: LevelIndex,
    reward_total: Amount,
    deposit_at_mode: Amount,
    count_at_mode: u64,
}

impl PhaseSlot {
    fn new(escrow: HolderId, level_max: LevelIndex) -> Self {
        Self {
            commitments: BTreeMap::new(),
            escrow,
            deposit_total: 0,
            mode_level: level_max,
            reward_total: 0,
            deposit_at_mode: 0,
            count_at_mode: 0,
        }
    }

    fn reset(&mut self, level_max: LevelIndex) {
        self.commitments.clear();
        self.deposit_total = 0;
        self.mode_level = level_max;
        self.reward_total = 0;
        self.deposit_at_mode = 0;
        self.count_at_mode = 0;
    }
}

/// The result of crossing a phase boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseAdvance {
    /// The phase just entered.
    pub phase_id: PhaseId,
    /// Fresh value minted into the settled slot's reward pool.
    pub minted: Amount,
    /// Escrow remainder burned from the vacated slot (unclaimed principal
    /// and unpaid rewards).
    pub reclaimed: Amount,
}

/// The commit-reveal consensus oracle.
pub struct Oracle {
    config: OracleConfig,
    account: Account,
    registry: SupplyId,
    phase_id: PhaseId,
    slots: [PhaseSlot; 3],
    hasher: Box<dyn CommitmentHasher>,
    audit: Vec<OracleRecord>,
}

impl Oracle {
    /// Create an oracle with the reference BLAKE3 commitment hasher.
    ///
    /// Creates the three slot escrow cells in `registry`, controlled by
    /// `account`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidConfig`] if the configuration is invalid
    /// - [`OracleError::Ledger`] if the registry handle is unknown
    pub fn new(
        config: OracleConfig,
        account: Account,
        ledger: &mut Ledger,
        registry: SupplyId,
    ) -> Result<Self> {
        Self::with_hasher(config, account, ledger, registry, Box::new(Blake3Hasher))
    }

    /// Create an oracle with a caller-supplied commitment hasher.
    pub fn with_hasher(
        config: OracleConfig,
        account: Account,
        ledger: &mut Ledger,
        registry: SupplyId,
        hasher: Box<dyn CommitmentHasher>,
    ) -> Result<Self> {
        config.validate()?;
        let level_max = config.level_max;
        let slots = [
            PhaseSlot::new(ledger.create_holder(registry, Some(account))?, level_max),
            PhaseSlot::new(ledger.create_holder(registry, Some(account))?, level_max),
            PhaseSlot::new(ledger.create_holder(registry, Some(account))?, level_max),
        ];
        tracing::info!(
            account = %hex::encode(account),
            level_max,
            "oracle created"
        );
        Ok(Self {
            config,
            account,
            registry,
            phase_id: GENESIS_PHASE,
            slots,
            hasher,
            audit: Vec::new(),
        })
    }

    /// Accept a hashed commitment with a locked deposit.
    ///
    /// The funding cell must hold exactly `deposit` and be controlled by
    /// the oracle account; its whole balance moves into the slot escrow,
    /// leaving the cell at zero.
    ///
    /// Returns `Ok(false)` — a no-op — if this voter already committed in
    /// the current commit slot; the first commitment is not overwritten.
    ///
    /// # Errors
    ///
    /// - [`OracleError::EscrowMismatch`] if the funding cell's balance
    ///   differs from `deposit`
    /// - [`OracleError::Ledger`] if the escrow transfer is rejected
    pub fn commit(
        &mut self,
        ledger: &mut Ledger,
        account: Account,
        digest: Digest,
        deposit: Amount,
        escrow_holder: HolderId,
    ) -> Result<bool> {
        let idx = self.slot_index(PhaseRole::Commit);
        if self.slots[idx].commitments.contains_key(&account) {
            tracing::debug!(
                account = %hex::encode(account),
                phase_id = self.phase_id,
                "duplicate commitment rejected"
            );
            return Ok(false);
        }
        let available = ledger.amount_of(escrow_holder)?;
        if available != deposit {
            return Err(OracleError::EscrowMismatch {
                expected: deposit,
                actual: available,
            });
        }
        ledger.send_to(self.account, self.slots[idx].escrow, escrow_holder, deposit)?;

        let level_max = self.config.level_max;
        let slot = &mut self.slots[idx];
        slot.deposit_total += deposit;
        slot.commitments.insert(
            account,
            Commitment {
                digest,
                deposit,
                revealed: false,
                revealed_correctly: false,
                level: level_max,
                reclaimed: false,
            },
        );

        tracing::info!(
            account = %hex::encode(account),
            deposit,
            phase_id = self.phase_id,
            "commitment accepted"
        );
        self.record(OracleEvent::Commit {
            account,
            digest,
            deposit,
        });
        Ok(true)
    }

    /// Disclose the level and salt behind a prior commitment.
    ///
    /// A disclosure is correct when its digest matches the commitment and
    /// the level lies in `0..level_max`. An incorrect disclosure is a
    /// normal protocol outcome, not an error: the commitment is marked
    /// revealed-incorrectly and the deposit stays escrowed for forfeiture.
    ///
    /// Returns `false` when no un-revealed commitment exists for this
    /// voter in the reveal slot.
    pub fn reveal(&mut self, account: Account, level: LevelIndex, salt: Nonce) -> bool {
        let expected = self.hasher.digest(&account, level, salt);
        let level_max = self.config.level_max;
        let idx = self.slot_index(PhaseRole::Reveal);
        let correct = match self.slots[idx].commitments.get_mut(&account) {
            None => {
                tracing::debug!(
                    account = %hex::encode(account),
                    "reveal without matching commitment"
                );
                return false;
            }
            Some(c) if c.revealed => {
                tracing::debug!(
                    account = %hex::encode(account),
                    "commitment already revealed"
                );
                return false;
            }
            Some(c) => {
                c.revealed = true;
                let correct = expected == c.digest && level < level_max;
                if correct {
                    c.revealed_correctly = true;
                    c.level = level;
                }
                correct
            }
        };

        tracing::info!(
            account = %hex::encode(account),
            level,
            correct,
            phase_id = self.phase_id,
            "reveal recorded"
        );
        self.record(OracleEvent::Reveal {
            account,
            level,
            salt,
            correct,
        });
        true
    }

    /// Cross a phase boundary. Called exactly once per boundary by the
    /// external driver, with the fresh value to inject into the settling
    /// slot's reward pool.
    ///
    /// Closes the reveal window (histogram, mode level, reward pool),
    /// burns the vacated slot's escrow remainder, and rotates the phase
    /// counter. The vacated slot becomes the next commit slot.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Ledger`] if the reward mint or remainder burn is
    ///   rejected (the oracle account must hold registry control)
    /// - [`OracleError::ConservationViolation`] if the settlement sums do
    ///   not reconcile (unreachable when the ledger invariants hold)
    pub fn advance_phase(&mut self, ledger: &mut Ledger, mint_amount: Amount) -> Result<PhaseAdvance> {
        let level_max = self.config.level_max;
        let ridx = self.slot_index(PhaseRole::Reveal);
        let vidx = self.slot_index(PhaseRole::Reclaim);

        // Close the reveal window: fold correct reveals into the histogram.
        let mut hist = LevelHistogram::new(level_max);
        for c in self.slots[ridx].commitments.values() {
            if c.revealed_correctly {
                hist.record(c.level, c.deposit);
            }
        }
        let deposit_total = self.slots[ridx].deposit_total;
        let (mode_level, deposit_to_reclaim, deposit_at_mode, count_at_mode) =
            match hist.mode_level() {
                Some(mode) => (
                    mode,
                    hist.window_deposit(mode, self.config.reclaim_threshold),
                    hist.deposit_at(mode),
                    hist.count_at(mode),
                ),
                // No consensus: sentinel level, every deposit forfeited.
                None => (level_max, 0, 0, 0),
            };
        let forfeited = deposit_total
            .checked_sub(deposit_to_reclaim)
            .ok_or(OracleError::ConservationViolation {
                expected: deposit_total,
                actual: deposit_to_reclaim,
            })?;
        let reward_total = forfeited
            .checked_add(mint_amount)
            .ok_or(OracleError::Ledger(LedgerError::OutOfBounds))?;

        // Conservation law for the settling slot.
        let expected = deposit_total
            .checked_add(mint_amount)
            .ok_or(OracleError::Ledger(LedgerError::OutOfBounds))?;
        let actual = deposit_to_reclaim
            .checked_add(reward_total)
            .ok_or(OracleError::Ledger(LedgerError::OutOfBounds))?;
        if expected != actual {
            return Err(OracleError::ConservationViolation { expected, actual });
        }

        // Inject the reward into the settling slot's escrow; drain and burn
        // whatever the vacated slot still holds.
        ledger.mint(self.account, self.slots[ridx].escrow, mint_amount)?;
        let remainder = ledger.amount_of(self.slots[vidx].escrow)?;
        if remainder > 0 {
            ledger.burn(self.account, self.slots[vidx].escrow, remainder)?;
        }

        let slot = &mut self.slots[ridx];
        slot.mode_level = mode_level;
        slot.reward_total = reward_total;
        slot.deposit_at_mode = deposit_at_mode;
        slot.count_at_mode = count_at_mode;
        self.slots[vidx].reset(level_max);

        self.phase_id += 1;
        tracing::info!(
            phase_id = self.phase_id,
            mode_level,
            reward_total,
            reclaimed = remainder,
            "phase advanced"
        );
        self.record(OracleEvent::PhaseAdvance {
            mode_level,
            reward_total,
            minted: mint_amount,
            reclaimed: remainder,
        });
        Ok(PhaseAdvance {
            phase_id: self.phase_id,
            minted: mint_amount,
            reclaimed: remainder,
        })
    }

    /// Settle a voter's commitment in the reclaim slot.
    ///
    /// Payout rules for a correctly-revealed commitment:
    ///
    /// - exact match with the mode level: deposit plus the proportional
    ///   and constant reward shares;
    /// - within `reclaim_threshold` of the mode: deposit only;
    /// - outside the window: nothing (the deposit was folded into the
    ///   reward pool at settlement).
    ///
    /// Returns `Ok(0)` — without touching the ledger — when there is no
    /// commitment, the reveal was absent or incorrect, or the commitment
    /// was already reclaimed. Settlement is consumed exactly once.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Ledger`] if the payout transfer is rejected; the
    ///   commitment stays unconsumed in that case
    pub fn reclaim(
        &mut self,
        ledger: &mut Ledger,
        account: Account,
        destination: HolderId,
    ) -> Result<Amount> {
        let idx = self.slot_index(PhaseRole::Reclaim);
        let (deposit, level) = match self.slots[idx].commitments.get(&account) {
            None => {
                tracing::debug!(
                    account = %hex::encode(account),
                    "reclaim without matching commitment"
                );
                return Ok(0);
            }
            Some(c) if c.reclaimed || !c.revealed_correctly => {
                tracing::debug!(
                    account = %hex::encode(account),
                    reclaimed = c.reclaimed,
                    "nothing to reclaim"
                );
                return Ok(0);
            }
            Some(c) => (c.deposit, c.level),
        };

        let slot = &self.slots[idx];
        let payout = if slot.mode_level == self.config.level_max {
            // No consensus this epoch: the whole pool rolls forward.
            0
        } else if level == slot.mode_level {
            self.exact_match_payout(deposit, slot.reward_total, slot.deposit_at_mode, slot.count_at_mode)
        } else {
            let lo = slot.mode_level.saturating_sub(self.config.reclaim_threshold);
            let hi = slot.mode_level.saturating_add(self.config.reclaim_threshold);
            if level >= lo && level <= hi {
                deposit
            } else {
                0
            }
        };

        if payout > 0 {
            let escrow = slot.escrow;
            ledger.send_to(self.account, destination, escrow, payout)?;
        }
        if let Some(c) = self.slots[idx].commitments.get_mut(&account) {
            c.reclaimed = true;
        }

        tracing::info!(
            account = %hex::encode(account),
            payout,
            phase_id = self.phase_id,
            "reclaim settled"
        );
        self.record(OracleEvent::Reclaim { account, payout });
        Ok(payout)
    }

    /// The current phase counter.
    pub fn phase_id(&self) -> PhaseId {
        self.phase_id
    }

    /// The oracle's parameters.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// The registry the escrow cells live in.
    pub fn registry(&self) -> SupplyId {
        self.registry
    }

    /// The published consensus level of the currently-settling slot, or
    /// `level_max` when that epoch reached no consensus.
    pub fn mode_level(&self) -> LevelIndex {
        self.slots[self.slot_index(PhaseRole::Reclaim)].mode_level
    }

    /// The reward pool of the currently-settling slot.
    pub fn reward_total(&self) -> Amount {
        self.slots[self.slot_index(PhaseRole::Reclaim)].reward_total
    }

    /// Total deposits committed into the slot serving `role` this phase.
    pub fn deposit_total(&self, role: PhaseRole) -> Amount {
        self.slots[self.slot_index(role)].deposit_total
    }

    /// A voter's commitment in the slot serving `role` this phase.
    pub fn commitment(&self, role: PhaseRole, account: &Account) -> Option<&Commitment> {
        self.slots[self.slot_index(role)].commitments.get(account)
    }

    /// The escrow cell of the slot serving `role` this phase.
    pub fn escrow(&self, role: PhaseRole) -> HolderId {
        self.slots[self.slot_index(role)].escrow
    }

    /// The append-only oracle audit log, in operation order.
    pub fn audit_log(&self) -> &[OracleRecord] {
        &self.audit
    }

    /// Exact-match payout: deposit plus floor-divided proportional and
    /// constant reward shares. 128-bit intermediates; the result is
    /// bounded by the slot escrow balance, which the ledger keeps within
    /// `Amount`.
    fn exact_match_payout(
        &self,
        deposit: Amount,
        reward_total: Amount,
        deposit_at_mode: Amount,
        count_at_mode: u64,
    ) -> Amount {
        let rate = u128::from(self.config.proportional_reward_rate);
        let proportional = if deposit_at_mode > 0 {
            rate * u128::from(reward_total) * u128::from(deposit)
                / (100u128 * u128::from(deposit_at_mode))
        } else {
            0
        };
        let constant = if count_at_mode > 0 {
            (100 - rate) * u128::from(reward_total) / (100u128 * u128::from(count_at_mode))
        } else {
            0
        };
        (u128::from(deposit) + proportional + constant) as Amount
    }

    fn slot_index(&self, role: PhaseRole) -> usize {
        let offset = match role {
            PhaseRole::Commit => 0,
            PhaseRole::Reveal => 1,
            PhaseRole::Reclaim => 2,
        };
        ((self.phase_id - offset) % 3) as usize
    }

    fn record(&mut self, event: OracleEvent) {
        let seq = self.audit.len() as u64;
        self.audit.push(OracleRecord {
            seq,
            phase_id: self.phase_id,
            event,
        });
    }
}
