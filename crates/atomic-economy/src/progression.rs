//! Complex progression: quotes, purchases and upgrades.
//!
//! Production is linear in level (`base_production · level`) and is stored
//! once, on the ownership record. Every level change recomputes it and then
//! recomputes the account's cached total, so the two can never drift.

use atomic_catalog::{Catalog, ComplexDef, Prerequisite};
use atomic_ledger::audit::owned_production;
use atomic_ledger::wallet;
use atomic_types::{AccountRecord, ComplexKind, ComplexOwnership, ResourceBundle};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::EconomyError;
use crate::math::{floor_units, mul};

/// Everything the front-end shows about the next level of one complex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeQuote {
    /// The complex quoted.
    pub kind: ComplexKind,
    /// Display name.
    pub name: &'static str,
    /// Owned level (0 if not purchased).
    pub current_level: u32,
    /// Level after the next purchase or upgrade.
    pub next_level: u32,
    /// Production per second at the current level.
    pub current_production: Decimal,
    /// Production per second at the next level.
    pub next_production: Decimal,
    /// Cost of the next level.
    pub cost: ResourceBundle,
    /// Whether the next level can be bought as far as prerequisites go.
    pub unlocked: bool,
    /// Whether current balances cover [`UpgradeQuote::cost`].
    pub affordable: bool,
    /// The unmet prerequisite, when locked.
    pub missing_prerequisite: Option<Prerequisite>,
}

/// Outcome of a successful purchase or upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelChange {
    /// The complex changed.
    pub kind: ComplexKind,
    /// Its new level.
    pub level: u32,
    /// Its new production per second.
    pub production: Decimal,
    /// What was debited.
    pub cost: ResourceBundle,
    /// The account's new total production rate.
    pub total_production_rate: Decimal,
}

/// Cost of moving `def` from `level` to `level + 1`.
///
/// Each component is `floor(base · growth^level)`; components with a zero
/// base stay zero.
pub fn upgrade_cost(def: &ComplexDef, level: u32) -> Result<ResourceBundle, EconomyError> {
    let mut factor = Decimal::ONE;
    for _ in 0..level {
        factor = mul(factor, def.cost_growth, "cost growth")?;
    }

    let mut cost = ResourceBundle::ZERO;
    for (resource, base) in def.base_cost.iter() {
        let exact = mul(Decimal::from(base), factor, "cost component")?;
        *cost.get_mut(resource) = floor_units(exact, "cost component")?;
    }
    Ok(cost)
}

/// Production per second of `def` at `level`.
pub fn production_at(def: &ComplexDef, level: u32) -> Result<Decimal, EconomyError> {
    mul(def.base_production, Decimal::from(level), "production")
}

/// The prerequisite still blocking `def`, if any.
///
/// Owned complexes are never blocked: the check only guards the first
/// purchase.
pub fn missing_prerequisite(record: &AccountRecord, def: &ComplexDef) -> Option<Prerequisite> {
    if record.owns(def.kind) {
        return None;
    }
    def.prerequisite
        .filter(|p| record.level_of(p.kind) < p.level)
}

/// Quote the next level of `kind` for the account.
pub fn quote(
    record: &AccountRecord,
    catalog: &Catalog,
    kind: ComplexKind,
) -> Result<UpgradeQuote, EconomyError> {
    let def = catalog
        .complex(kind)
        .ok_or(EconomyError::UnknownComplex(kind))?;
    let current_level = record.level_of(kind);
    let next_level = current_level
        .checked_add(1)
        .ok_or_else(|| EconomyError::overflow("next level"))?;
    let cost = upgrade_cost(def, current_level)?;
    let missing = missing_prerequisite(record, def);

    Ok(UpgradeQuote {
        kind,
        name: def.name,
        current_level,
        next_level,
        current_production: production_at(def, current_level)?,
        next_production: production_at(def, next_level)?,
        affordable: wallet::can_afford(&record.account.balances, &cost),
        cost,
        unlocked: missing.is_none(),
        missing_prerequisite: missing,
    })
}

/// Quotes for every catalog complex, in catalog order.
pub fn quote_all(record: &AccountRecord, catalog: &Catalog) -> Result<Vec<UpgradeQuote>, EconomyError> {
    catalog
        .complexes()
        .map(|def| quote(record, catalog, def.kind))
        .collect()
}

/// Buy the first level of `kind`.
///
/// # Order of checks
///
/// 1. Account not banned
/// 2. Complex exists and is not owned
/// 3. Prerequisite satisfied
/// 4. Balances cover the level 0 -> 1 cost
pub fn purchase(
    record: &mut AccountRecord,
    catalog: &Catalog,
    kind: ComplexKind,
    now: DateTime<Utc>,
) -> Result<LevelChange, EconomyError> {
    crate::ensure_active(&record.account)?;
    let def = catalog
        .complex(kind)
        .ok_or(EconomyError::UnknownComplex(kind))?;
    if record.owns(kind) {
        return Err(EconomyError::AlreadyOwned(kind));
    }
    if let Some(p) = missing_prerequisite(record, def) {
        return Err(EconomyError::LockedPrerequisite {
            requires: p.kind,
            level: p.level,
            current: record.level_of(p.kind),
        });
    }

    let cost = upgrade_cost(def, 0)?;
    let production = production_at(def, 1)?;
    wallet::debit(&mut record.account, &cost)?;

    record.complexes.insert(
        kind,
        ComplexOwnership {
            kind,
            level: 1,
            production,
            last_upgraded_at: now,
        },
    );
    let total_production_rate = recompute_total_production(record, now);

    debug!(account = %record.account.id, complex = %kind, "Complex purchased");
    Ok(LevelChange {
        kind,
        level: 1,
        production,
        cost,
        total_production_rate,
    })
}

/// Raise an owned complex by one level.
pub fn upgrade(
    record: &mut AccountRecord,
    catalog: &Catalog,
    kind: ComplexKind,
    now: DateTime<Utc>,
) -> Result<LevelChange, EconomyError> {
    crate::ensure_active(&record.account)?;
    let def = catalog
        .complex(kind)
        .ok_or(EconomyError::UnknownComplex(kind))?;
    let current = record.level_of(kind);
    if current == 0 {
        return Err(EconomyError::NotOwned(kind));
    }

    let level = current
        .checked_add(1)
        .ok_or_else(|| EconomyError::overflow("level increment"))?;
    let cost = upgrade_cost(def, current)?;
    let production = production_at(def, level)?;
    wallet::debit(&mut record.account, &cost)?;

    if let Some(owned) = record.complexes.get_mut(&kind) {
        owned.level = level;
        owned.production = production;
        owned.last_upgraded_at = now;
    }
    let total_production_rate = recompute_total_production(record, now);

    debug!(account = %record.account.id, complex = %kind, level, "Complex upgraded");
    Ok(LevelChange {
        kind,
        level,
        production,
        cost,
        total_production_rate,
    })
}

/// Reset the cached total to the sum of owned production.
pub fn recompute_total_production(record: &mut AccountRecord, now: DateTime<Utc>) -> Decimal {
    let total = owned_production(record);
    record.account.total_production_rate = total;
    record.account.updated_at = now;
    total
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atomic_ledger::{AuditResult, audit::verify_production};

    use super::*;
    use crate::testing::{catalog, record_with};

    #[test]
    fn cost_follows_exponential_curve() {
        let catalog = catalog();
        let kollektiv = catalog.complex(ComplexKind::Kollektiv1).unwrap();
        assert_eq!(upgrade_cost(kollektiv, 0).unwrap().energons, 100);
        assert_eq!(upgrade_cost(kollektiv, 1).unwrap().energons, 150);
        assert_eq!(upgrade_cost(kollektiv, 2).unwrap().energons, 225);
        // 100 * 1.5^3 = 337.5
        assert_eq!(upgrade_cost(kollektiv, 3).unwrap().energons, 337);
    }

    #[test]
    fn cost_is_monotonic_in_level() {
        let catalog = catalog();
        for def in catalog.complexes() {
            let mut previous = upgrade_cost(def, 0).unwrap();
            for level in 1..25 {
                let next = upgrade_cost(def, level).unwrap();
                for (resource, amount) in previous.iter() {
                    assert!(
                        next.get(resource) > amount,
                        "{} {resource} not growing at level {level}",
                        def.kind
                    );
                }
                previous = next;
            }
        }
    }

    #[test]
    fn zero_components_stay_zero() {
        let catalog = catalog();
        let zarya = catalog.complex(ComplexKind::ZaryaM).unwrap();
        let cost = upgrade_cost(zarya, 4).unwrap();
        assert_eq!(cost.neutrons, 0);
        assert_eq!(cost.particles, 0);
    }

    #[test]
    fn quote_reports_locked_prerequisite() {
        let catalog = catalog();
        let record = record_with(1_000_000, &[(ComplexKind::Kollektiv1, 2)]);
        let q = quote(&record, &catalog, ComplexKind::ZaryaM).unwrap();
        assert_eq!(q.current_level, 0);
        assert_eq!(q.next_level, 1);
        assert!(!q.unlocked);
        assert!(q.affordable);
        assert_eq!(
            q.missing_prerequisite,
            Some(Prerequisite {
                kind: ComplexKind::Kollektiv1,
                level: 3
            })
        );
    }

    #[test]
    fn quote_all_covers_catalog() {
        let catalog = catalog();
        let record = record_with(0, &[(ComplexKind::Kollektiv1, 1)]);
        let quotes = quote_all(&record, &catalog).unwrap();
        assert_eq!(quotes.len(), 10);
        let base = quotes
            .iter()
            .find(|q| q.kind == ComplexKind::Kollektiv1)
            .unwrap();
        assert_eq!(base.current_production, Decimal::ONE);
        assert_eq!(base.next_production, Decimal::TWO);
        assert!(!base.affordable);
    }

    #[test]
    fn purchase_debits_and_inserts_level_one() {
        let catalog = catalog();
        let mut record = record_with(600, &[(ComplexKind::Kollektiv1, 3)]);
        let change = purchase(&mut record, &catalog, ComplexKind::ZaryaM, Utc::now()).unwrap();
        assert_eq!(change.level, 1);
        assert_eq!(change.cost.energons, 500);
        assert_eq!(record.account.balances.energons, 100);
        assert_eq!(record.level_of(ComplexKind::ZaryaM), 1);
        assert_eq!(verify_production(&record), AuditResult::Consistent);
    }

    #[test]
    fn purchase_twice_is_rejected() {
        let catalog = catalog();
        let mut record = record_with(10_000, &[(ComplexKind::Kollektiv1, 1)]);
        let err = purchase(&mut record, &catalog, ComplexKind::Kollektiv1, Utc::now()).unwrap_err();
        assert_eq!(err, EconomyError::AlreadyOwned(ComplexKind::Kollektiv1));
        assert_eq!(record.account.balances.energons, 10_000);
    }

    #[test]
    fn locked_purchase_changes_nothing() {
        let catalog = catalog();
        let mut record = record_with(10_000, &[(ComplexKind::Kollektiv1, 4)]);
        let before = record.clone();
        let err = purchase(&mut record, &catalog, ComplexKind::SoyuzAtom, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            EconomyError::LockedPrerequisite {
                requires: ComplexKind::Kollektiv1,
                level: 5,
                current: 4
            }
        );
        assert_eq!(record, before);
    }

    #[test]
    fn unaffordable_upgrade_changes_nothing() {
        let catalog = catalog();
        let mut record = record_with(149, &[(ComplexKind::Kollektiv1, 1)]);
        let before = record.clone();
        let err = upgrade(&mut record, &catalog, ComplexKind::Kollektiv1, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientResources {
                resource: atomic_types::Resource::Energons,
                required: 150,
                available: 149
            }
        );
        assert_eq!(record, before);
    }

    #[test]
    fn upgrade_recomputes_linear_production() {
        let catalog = catalog();
        let mut record = record_with(150, &[(ComplexKind::Kollektiv1, 1)]);
        let change = upgrade(&mut record, &catalog, ComplexKind::Kollektiv1, Utc::now()).unwrap();
        assert_eq!(change.level, 2);
        assert_eq!(change.production, Decimal::TWO);
        assert_eq!(record.account.balances.energons, 0);
        assert_eq!(record.account.total_production_rate, Decimal::TWO);
        assert_eq!(verify_production(&record), AuditResult::Consistent);
    }

    #[test]
    fn upgrade_requires_ownership() {
        let catalog = catalog();
        let mut record = record_with(1_000_000, &[]);
        let err = upgrade(&mut record, &catalog, ComplexKind::ZaryaM, Utc::now()).unwrap_err();
        assert_eq!(err, EconomyError::NotOwned(ComplexKind::ZaryaM));
    }

    #[test]
    fn owned_complex_upgrades_after_prerequisite_lapses() {
        // ZARYA-M owned while KOLLEKTIV-1 is only level 1: grandfathered.
        let catalog = catalog();
        let mut record = record_with(
            10_000,
            &[(ComplexKind::Kollektiv1, 1), (ComplexKind::ZaryaM, 1)],
        );
        let change = upgrade(&mut record, &catalog, ComplexKind::ZaryaM, Utc::now()).unwrap();
        assert_eq!(change.level, 2);
        assert_eq!(change.cost.energons, 800);
    }

    #[test]
    fn banned_account_cannot_purchase() {
        let catalog = catalog();
        let mut record = record_with(10_000, &[(ComplexKind::Kollektiv1, 5)]);
        record.account.banned = true;
        let err = purchase(&mut record, &catalog, ComplexKind::SoyuzAtom, Utc::now()).unwrap_err();
        assert_eq!(err, EconomyError::Banned);
    }
}
