//! Satellite payouts and the daily bonus.

use atomic_catalog::{Catalog, ComplexRole};
use atomic_ledger::wallet;
use atomic_types::{Account, AccountRecord, ComplexKind, ResourceBundle};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::EconomyError;
use crate::config::EconomyRules;
use crate::math::{after, floor_units, level_bonus, mul};

/// A satellite payout that was credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SatellitePayout {
    /// The satellite complex.
    pub kind: ComplexKind,
    /// Its level at payout time.
    pub level: u32,
    /// Energons credited.
    pub amount: u64,
    /// Next eligible payout time.
    pub next_at: DateTime<Utc>,
}

/// A claimed daily bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyBonus {
    /// Streak after this claim.
    pub streak: u32,
    /// Energons credited.
    pub amount: u64,
}

/// Pay the satellite bonus if the account owns a satellite and is due.
///
/// The payout is `floor(total_rate · period · (1 + per_level · level))`
/// energons, after which the next payout is scheduled `period` seconds
/// from `now`. An account that was never scheduled is due immediately.
pub fn pay_satellite(
    record: &mut AccountRecord,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<Option<SatellitePayout>, EconomyError> {
    crate::ensure_active(&record.account)?;
    let Some(def) = catalog.find_role(|role| matches!(role, ComplexRole::Satellite { .. })) else {
        return Ok(None);
    };
    let ComplexRole::Satellite {
        period_secs,
        per_level,
    } = def.role
    else {
        return Ok(None);
    };

    let level = record.level_of(def.kind);
    if level == 0 || record.account.next_satellite_at.is_some_and(|at| now < at) {
        return Ok(None);
    }

    let window = mul(
        record.account.total_production_rate,
        Decimal::from(period_secs),
        "satellite window",
    )?;
    let exact = mul(window, level_bonus(per_level, level)?, "satellite bonus")?;
    let amount = floor_units(exact, "satellite bonus")?;
    let next_at = after(now, period_secs)?;

    wallet::credit(&mut record.account, &ResourceBundle::energons(amount))?;
    record.account.next_satellite_at = Some(next_at);
    record.account.updated_at = now;

    Ok(Some(SatellitePayout {
        kind: def.kind,
        level,
        amount,
        next_at,
    }))
}

/// Claim today's bonus: the streak grows by one and pays
/// `base + (streak - 1) · step` energons.
pub fn claim_daily(
    account: &mut Account,
    rules: &EconomyRules,
    now: DateTime<Utc>,
) -> Result<DailyBonus, EconomyError> {
    crate::ensure_active(account)?;
    if account.daily_bonus_claimed {
        return Err(EconomyError::AlreadyClaimed {
            streak: account.bonus_streak,
        });
    }

    let streak = account
        .bonus_streak
        .checked_add(1)
        .ok_or_else(|| EconomyError::overflow("bonus streak"))?;
    let amount = rules
        .daily_bonus_for(streak)
        .ok_or_else(|| EconomyError::overflow("daily bonus"))?;

    wallet::credit(account, &ResourceBundle::energons(amount))?;
    account.bonus_streak = streak;
    account.daily_bonus_claimed = true;
    account.updated_at = now;

    Ok(DailyBonus { streak, amount })
}
