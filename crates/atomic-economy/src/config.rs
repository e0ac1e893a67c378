//! Tunable economy parameters.
//!
//! [`EconomyRules`] bundles the numbers that are not part of the catalog:
//! starting balance, base click power and the daily bonus curve. The server
//! builds it from the `economy` section of `atomic-config.yaml` and passes it
//! into the functions that need it; tests use [`Default`].

use serde::{Deserialize, Serialize};

/// Economy parameters shared by registration, clicks and the daily bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Energons credited to a newly registered account (default: 100).
    pub starting_energons: u64,

    /// Energons per manual click before amplifiers and boosters (default: 10).
    pub base_click_power: u64,

    /// Daily bonus paid on the first day of a streak (default: 100).
    pub daily_bonus_base: u64,

    /// Extra energons per consecutive day after the first (default: 50).
    pub daily_bonus_step: u64,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            starting_energons: 100,
            base_click_power: 10,
            daily_bonus_base: 100,
            daily_bonus_step: 50,
        }
    }
}

impl EconomyRules {
    /// Daily bonus for the given streak day (1-based).
    ///
    /// Returns `None` on overflow.
    pub fn daily_bonus_for(&self, streak: u32) -> Option<u64> {
        let extra_days = u64::from(streak.saturating_sub(1));
        self.daily_bonus_step
            .checked_mul(extra_days)
            .and_then(|extra| self.daily_bonus_base.checked_add(extra))
    }
}
