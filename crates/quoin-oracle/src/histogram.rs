//! Deposit-weighted level histogram and mode computation.
//!
//! When a reveal window closes, the oracle folds every correctly-revealed
//! commitment of that slot into a histogram: per level, the summed deposit
//! and the voter count. The consensus ("mode") level is the one with the
//! strictly greatest deposit, ties broken by greater voter count, remaining
//! ties by lower level. A level nobody voted for is never selected; an
//! empty histogram has no mode (the caller maps that to the `level_max`
//! sentinel).

use quoin_types::{Amount, LevelIndex};

/// Histogram over the levels `0..level_max` for one phase slot.
#[derive(Clone, Debug)]
pub struct LevelHistogram {
    deposit_at: Vec<Amount>,
    count_at: Vec<u64>,
}

impl LevelHistogram {
    /// Create an empty histogram over `level_max` levels.
    pub fn new(level_max: LevelIndex) -> Self {
        Self {
            deposit_at: vec![0; level_max as usize],
            count_at: vec![0; level_max as usize],
        }
    }

    /// Fold one correctly-revealed vote into the histogram.
    ///
    /// Votes outside `0..level_max` are ignored; the oracle never records
    /// an out-of-range level as correctly revealed in the first place.
    pub fn record(&mut self, level: LevelIndex, deposit: Amount) {
        let Some(slot) = self.deposit_at.get_mut(level as usize) else {
            return;
        };
        *slot += deposit;
        self.count_at[level as usize] += 1;
    }

    /// Summed deposit of voters at `level` (0 for out-of-range levels).
    pub fn deposit_at(&self, level: LevelIndex) -> Amount {
        self.deposit_at.get(level as usize).copied().unwrap_or(0)
    }

    /// Number of voters at `level` (0 for out-of-range levels).
    pub fn count_at(&self, level: LevelIndex) -> u64 {
        self.count_at.get(level as usize).copied().unwrap_or(0)
    }

    /// The consensus level, or `None` if nobody voted.
    ///
    /// Selection: strictly greatest `deposit_at`, ties broken by strictly
    /// greater `count_at`, remaining ties by the lower level.
    pub fn mode_level(&self) -> Option<LevelIndex> {
        let mut best: Option<LevelIndex> = None;
        for level in 0..self.deposit_at.len() {
            if self.count_at[level] == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => {
                    self.deposit_at[level] > self.deposit_at[b as usize]
                        || (self.deposit_at[level] == self.deposit_at[b as usize]
                            && self.count_at[level] > self.count_at[b as usize])
                }
            };
            if better {
                best = Some(level as LevelIndex);
            }
        }
        best
    }

    /// Summed deposit over the reclaim window
    /// `[mode - threshold, mode + threshold] ∩ [0, level_max)`.
    pub fn window_deposit(&self, mode: LevelIndex, threshold: LevelIndex) -> Amount {
        let lo = mode.saturating_sub(threshold) as usize;
        let hi = mode.saturating_add(threshold) as usize;
        self.deposit_at
            .iter()
            .take(hi + 1)
            .skip(lo)
            .copied()
            .sum()
    }
}
