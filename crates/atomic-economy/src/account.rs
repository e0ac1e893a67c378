//! New-account seeding.

use std::collections::BTreeMap;

use atomic_catalog::{Catalog, ComplexRole};
use atomic_ledger::wallet;
use atomic_types::{
    Account, AccountId, AccountRecord, ComplexOwnership, Resource, ResourceBundle,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::EconomyError;
use crate::config::EconomyRules;
use crate::progression::{production_at, recompute_total_production};

/// Build a fresh account: starting energons, the base energon producer at
/// level 1, neutral multipliers and no booster.
pub fn seed_account(
    external_id: i64,
    display_name: &str,
    catalog: &Catalog,
    rules: &EconomyRules,
    now: DateTime<Utc>,
) -> Result<AccountRecord, EconomyError> {
    let mut record = AccountRecord {
        account: Account {
            id: AccountId::new(),
            external_id,
            display_name: display_name.to_owned(),
            balances: ResourceBundle::ZERO,
            lifetime: ResourceBundle::ZERO,
            manual_clicks: 0,
            total_production_rate: Decimal::ZERO,
            production_multiplier: Decimal::ONE,
            click_multiplier: Decimal::ONE,
            active_booster: None,
            next_satellite_at: None,
            daily_bonus_claimed: false,
            bonus_streak: 0,
            banned: false,
            created_at: now,
            updated_at: now,
        },
        complexes: BTreeMap::new(),
    };

    wallet::credit(
        &mut record.account,
        &ResourceBundle::energons(rules.starting_energons),
    )?;

    let starter = catalog.complexes().find(|def| {
        def.prerequisite.is_none()
            && def.role
                == ComplexRole::Producer {
                    resource: Resource::Energons,
                }
    });
    if let Some(def) = starter {
        record.complexes.insert(
            def.kind,
            ComplexOwnership {
                kind: def.kind,
                level: 1,
                production: production_at(def, 1)?,
                last_upgraded_at: now,
            },
        );
    }
    recompute_total_production(&mut record, now);

    Ok(record)
}
