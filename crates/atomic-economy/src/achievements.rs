//! Achievements derived from account state. Nothing here is stored.

use atomic_catalog::{Catalog, ComplexRole};
use atomic_types::AccountRecord;
use serde::Serialize;

/// Progress towards one achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    /// Stable key.
    pub key: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Value required.
    pub target: u64,
    /// Current value.
    pub progress: u64,
    /// `progress / target` as a percentage, capped at 100.
    pub percent: u8,
    /// Whether the target is reached.
    pub completed: bool,
}

impl Achievement {
    fn new(key: &'static str, title: &'static str, target: u64, progress: u64) -> Self {
        let percent = progress
            .min(target)
            .saturating_mul(100)
            .checked_div(target)
            .map_or(100, |p| u8::try_from(p).unwrap_or(100));
        Self {
            key,
            title,
            target,
            progress,
            percent,
            completed: progress >= target,
        }
    }
}

/// All achievements for the account, in display order.
pub fn achievements(record: &AccountRecord, catalog: &Catalog) -> Vec<Achievement> {
    let lifetime = record.account.lifetime.energons;
    let automation_level = catalog
        .find_role(|role| *role == ComplexRole::LaborAutomation)
        .map_or(0, |def| record.level_of(def.kind));

    vec![
        Achievement::new("energons_1k", "1,000 lifetime energons", 1_000, lifetime),
        Achievement::new(
            "automation_5",
            "Automation level 5",
            5,
            u64::from(automation_level),
        ),
        Achievement::new(
            "streak_7",
            "7-day bonus streak",
            7,
            u64::from(record.account.bonus_streak),
        ),
        Achievement::new(
            "energons_1m",
            "1,000,000 lifetime energons",
            1_000_000,
            lifetime,
        ),
    ]
}
