//! Validated oracle parameters.
//!
//! The defaults are the reference parameters of the protocol: 9 discrete
//! levels, principal-only reclaim one level either side of the mode, and
//! 90% of the reward pool paid out proportionally to deposit size (the
//! remaining 10% split equally among exact-match voters).

use serde::{Deserialize, Serialize};

use quoin_types::LevelIndex;

use crate::{OracleError, Result};

/// Default number of discrete levels (valid levels are `0..LEVEL_MAX`).
pub const DEFAULT_LEVEL_MAX: LevelIndex = 9;

/// Default maximum distance from the mode level still eligible for
/// principal-only reclaim.
pub const DEFAULT_RECLAIM_THRESHOLD: LevelIndex = 1;

/// Default share of the reward pool distributed proportionally to deposit
/// size (percent; the remainder is split equally per exact-match voter).
pub const DEFAULT_PROPORTIONAL_REWARD_RATE: u8 = 90;

/// Oracle parameters, fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Number of discrete levels. The value `level_max` itself is the
    /// no-consensus sentinel.
    pub level_max: LevelIndex,
    /// Maximum level distance from the mode still eligible for
    /// principal-only reclaim.
    pub reclaim_threshold: LevelIndex,
    /// Percentage (0-100) of the reward pool paid proportionally to
    /// deposit size.
    pub proportional_reward_rate: u8,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            level_max: DEFAULT_LEVEL_MAX,
            reclaim_threshold: DEFAULT_RECLAIM_THRESHOLD,
            proportional_reward_rate: DEFAULT_PROPORTIONAL_REWARD_RATE,
        }
    }
}

impl OracleConfig {
    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidConfig`] if `level_max` is zero or the
    ///   reward rate exceeds 100
    pub fn validate(&self) -> Result<()> {
        if self.level_max == 0 {
            return Err(OracleError::InvalidConfig(
                "level_max must be at least 1".to_string(),
            ));
        }
        if self.proportional_reward_rate > 100 {
            return Err(OracleError::InvalidConfig(format!(
                "proportional_reward_rate must be 0-100, got {}",
                self.proportional_reward_rate
            )));
        }
        Ok(())
    }
}
