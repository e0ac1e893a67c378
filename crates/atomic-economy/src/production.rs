//! Passive production accrual.
//!
//! For each resource the per-second rate is
//!
//! ```text
//! rate(r) = Σ production(c) · bonus(r) · production_multiplier
//!           c produces r
//! bonus(r) = 1 + Σ per_level · level   (amplifiers of r, global amplifiers)
//! ```
//!
//! and a tick of `T` seconds credits `floor(rate(r) · T)` of each resource.
//! Labor automation adds `level · T` clicks at the account's click power.

use atomic_catalog::{Catalog, ComplexRole};
use atomic_ledger::wallet;
use atomic_types::{AccountRecord, ActiveBooster, Resource, ResourceBundle};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::EconomyRules;
use crate::math::{add, floor_units, mul};
use crate::{EconomyError, booster, click};

/// Resources credited by one accrual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accrual {
    /// Seconds of production accrued.
    pub secs: u64,
    /// Passive production per resource.
    pub passive: ResourceBundle,
    /// Clicks simulated by labor automation.
    pub automation_clicks: u64,
    /// Energons those clicks earned.
    pub automation_energons: u64,
    /// Everything credited.
    pub total: ResourceBundle,
    /// A booster that had lapsed and was reset before accruing.
    pub expired: Option<ActiveBooster>,
}

/// `1 + Σ per_level · level` over owned complexes whose role `select` picks.
pub(crate) fn amplifier(
    record: &AccountRecord,
    catalog: &Catalog,
    select: impl Fn(&ComplexRole) -> Option<Decimal>,
) -> Result<Decimal, EconomyError> {
    let mut total = Decimal::ONE;
    for owned in record.complexes.values() {
        let Some(per_level) = catalog.complex(owned.kind).and_then(|def| select(&def.role)) else {
            continue;
        };
        let step = mul(per_level, Decimal::from(owned.level), "amplifier")?;
        total = add(total, step, "amplifier")?;
    }
    Ok(total)
}

/// Additive bonus applied to every producer of `resource`.
pub fn resource_bonus(
    record: &AccountRecord,
    catalog: &Catalog,
    resource: Resource,
) -> Result<Decimal, EconomyError> {
    amplifier(record, catalog, |role| match *role {
        ComplexRole::ProductionAmplifier {
            resource: amplified,
            per_level,
        } if amplified == resource => Some(per_level),
        ComplexRole::GlobalAmplifier { per_level } => Some(per_level),
        _ => None,
    })
}

/// Effective per-second rate of `resource`, bonuses and booster included.
pub fn passive_rate(
    record: &AccountRecord,
    catalog: &Catalog,
    resource: Resource,
) -> Result<Decimal, EconomyError> {
    let mut base = Decimal::ZERO;
    for owned in record.complexes.values() {
        let produces = catalog
            .complex(owned.kind)
            .and_then(|def| def.produced_resource())
            == Some(resource);
        if produces {
            base = add(base, owned.production, "production sum")?;
        }
    }
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let bonus = resource_bonus(record, catalog, resource)?;
    let boosted = mul(base, bonus, "production bonus")?;
    mul(
        boosted,
        record.account.production_multiplier,
        "production multiplier",
    )
}

/// Passive production over `secs` seconds, floored per resource.
pub fn passive_yield(
    record: &AccountRecord,
    catalog: &Catalog,
    secs: u64,
) -> Result<ResourceBundle, EconomyError> {
    let window = Decimal::from(secs);
    let mut out = ResourceBundle::ZERO;
    for resource in Resource::ALL {
        let rate = passive_rate(record, catalog, resource)?;
        *out.get_mut(resource) = floor_units(mul(rate, window, "yield")?, "yield")?;
    }
    Ok(out)
}

/// Clicks simulated by labor-automation complexes over `secs` seconds.
pub fn automation_clicks(
    record: &AccountRecord,
    catalog: &Catalog,
    secs: u64,
) -> Result<u64, EconomyError> {
    record
        .complexes
        .values()
        .filter(|owned| {
            catalog
                .complex(owned.kind)
                .is_some_and(|def| def.role == ComplexRole::LaborAutomation)
        })
        .try_fold(0_u64, |acc, owned| {
            u64::from(owned.level)
                .checked_mul(secs)
                .and_then(|clicks| acc.checked_add(clicks))
                .ok_or_else(|| EconomyError::overflow("automation clicks"))
        })
}

/// Advance the account by `secs` seconds of production and credit it.
///
/// # Order of operations
///
/// 1. Reject banned accounts
/// 2. Expire a lapsed booster so its multiplier is not applied
/// 3. Compute passive yield and automation clicks
/// 4. Credit the sum in one checked update
pub fn accrue(
    record: &mut AccountRecord,
    catalog: &Catalog,
    rules: &EconomyRules,
    secs: u64,
    now: DateTime<Utc>,
) -> Result<Accrual, EconomyError> {
    crate::ensure_active(&record.account)?;
    let mut staged = record.clone();
    let expired = booster::expire_if_due(&mut staged.account, now);

    let passive = passive_yield(&staged, catalog, secs)?;
    let clicks = automation_clicks(&staged, catalog, secs)?;
    let automation_energons = if clicks == 0 {
        0
    } else {
        let power = click::click_power(&staged, catalog, rules)?;
        click::click_credit(clicks, power)?
    };

    let total = wallet::checked_sum(&passive, &ResourceBundle::energons(automation_energons))?;
    wallet::credit(&mut staged.account, &total)?;
    staged.account.updated_at = now;
    *record = staged;

    Ok(Accrual {
        secs,
        passive,
        automation_clicks: clicks,
        automation_energons,
        total,
        expired,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atomic_types::{BoosterKind, ComplexKind};

    use super::*;
    use crate::testing::{catalog, record_with};

    #[test]
    fn base_complex_yields_one_per_second() {
        let catalog = catalog();
        let mut record = record_with(100, &[(ComplexKind::Kollektiv1, 1)]);
        let accrual = accrue(&mut record, &catalog, &EconomyRules::default(), 60, Utc::now()).unwrap();
        assert_eq!(accrual.total, ResourceBundle::energons(60));
        assert_eq!(record.account.balances.energons, 160);
        assert_eq!(record.account.lifetime.energons, 160);
    }

    #[test]
    fn amplifier_scales_energon_producers() {
        // floor(1 * 3 * 1.10 * 60) = 198
        let catalog = catalog();
        let mut record = record_with(
            0,
            &[(ComplexKind::Kollektiv1, 3), (ComplexKind::ZaryaM, 2)],
        );
        let accrual = accrue(&mut record, &catalog, &EconomyRules::default(), 60, Utc::now()).unwrap();
        assert_eq!(accrual.passive.energons, 198);
    }

    #[test]
    fn global_amplifier_reaches_every_resource() {
        let catalog = catalog();
        let record = record_with(
            0,
            &[
                (ComplexKind::Kollektiv1, 5),
                (ComplexKind::ZaryaM, 1),
                (ComplexKind::SoyuzAtom, 3),
                (ComplexKind::Akademgorod17, 5),
            ],
        );
        assert_eq!(
            resource_bonus(&record, &catalog, Resource::Energons).unwrap(),
            Decimal::new(115, 2)
        );
        assert_eq!(
            resource_bonus(&record, &catalog, Resource::Neutrons).unwrap(),
            Decimal::new(110, 2)
        );
        // 0.2 * 3 * 1.10 = 0.66 neutrons/s -> 39.6 per minute
        let out = passive_yield(&record, &catalog, 60).unwrap();
        assert_eq!(out.neutrons, 39);
    }

    #[test]
    fn production_multiplier_applies() {
        let catalog = catalog();
        let mut record = record_with(0, &[(ComplexKind::Kollektiv1, 1)]);
        record.account.production_multiplier = Decimal::new(3, 0);
        record.account.active_booster = Some(ActiveBooster {
            kind: BoosterKind::ProtonM87,
            started_at: Utc::now(),
            ends_at: Utc::now() + chrono::TimeDelta::hours(4),
        });
        let accrual = accrue(&mut record, &catalog, &EconomyRules::default(), 60, Utc::now()).unwrap();
        assert_eq!(accrual.total.energons, 180);
        assert!(accrual.expired.is_none());
    }

    #[test]
    fn lapsed_booster_is_reset_before_accrual() {
        let catalog = catalog();
        let now = Utc::now();
        let mut record = record_with(0, &[(ComplexKind::Kollektiv1, 1)]);
        record.account.production_multiplier = Decimal::new(3, 0);
        record.account.active_booster = Some(ActiveBooster {
            kind: BoosterKind::ProtonM87,
            started_at: now - chrono::TimeDelta::hours(5),
            ends_at: now - chrono::TimeDelta::hours(1),
        });
        let accrual = accrue(&mut record, &catalog, &EconomyRules::default(), 60, now).unwrap();
        assert_eq!(accrual.total.energons, 60);
        assert_eq!(accrual.expired.map(|b| b.kind), Some(BoosterKind::ProtonM87));
        assert_eq!(record.account.production_multiplier, Decimal::ONE);
    }

    #[test]
    fn overflowing_accrual_leaves_record_unchanged() {
        let catalog = catalog();
        let now = Utc::now();
        let mut record = record_with(u64::MAX - 10, &[(ComplexKind::Kollektiv1, 1)]);
        record.account.production_multiplier = Decimal::new(3, 0);
        record.account.active_booster = Some(ActiveBooster {
            kind: BoosterKind::ProtonM87,
            started_at: now - chrono::TimeDelta::hours(5),
            ends_at: now - chrono::TimeDelta::hours(1),
        });
        let before = record.clone();

        let err = accrue(&mut record, &catalog, &EconomyRules::default(), 60, now).unwrap_err();
        assert!(matches!(err, EconomyError::ArithmeticOverflow { .. }));
        assert_eq!(record, before);
    }

    #[test]
    fn labor_automation_adds_clicks() {
        let catalog = catalog();
        let mut record = record_with(0, &[(ComplexKind::MozgMachina, 2)]);
        let accrual = accrue(&mut record, &catalog, &EconomyRules::default(), 60, Utc::now()).unwrap();
        assert_eq!(accrual.automation_clicks, 120);
        assert_eq!(accrual.automation_energons, 1_200);
        assert_eq!(accrual.passive, ResourceBundle::ZERO);
        assert_eq!(record.account.manual_clicks, 0);
    }

    #[test]
    fn idle_account_yields_nothing() {
        let catalog = catalog();
        let record = record_with(0, &[]);
        assert_eq!(passive_yield(&record, &catalog, 60).unwrap(), ResourceBundle::ZERO);
    }

    #[test]
    fn banned_account_does_not_accrue() {
        let catalog = catalog();
        let mut record = record_with(0, &[(ComplexKind::Kollektiv1, 1)]);
        record.account.banned = true;
        let err = accrue(&mut record, &catalog, &EconomyRules::default(), 60, Utc::now()).unwrap_err();
        assert_eq!(err, EconomyError::Banned);
    }
}
