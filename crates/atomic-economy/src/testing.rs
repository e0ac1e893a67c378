//! Fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use atomic_catalog::Catalog;
use atomic_types::{AccountRecord, ComplexKind, ComplexOwnership, ResourceBundle};
use chrono::Utc;

use crate::config::EconomyRules;
use crate::progression::{production_at, recompute_total_production};

pub fn catalog() -> Catalog {
    Catalog::standard().unwrap()
}

/// An account holding `energons` and exactly the listed complexes.
pub fn record_with(energons: u64, owned: &[(ComplexKind, u32)]) -> AccountRecord {
    let catalog = catalog();
    let now = Utc::now();
    let mut record =
        crate::account::seed_account(1, "tester", &catalog, &EconomyRules::default(), now).unwrap();
    record.account.balances = ResourceBundle::energons(energons);
    record.account.lifetime = ResourceBundle::energons(energons);
    record.complexes.clear();
    for &(kind, level) in owned {
        let def = catalog.complex(kind).unwrap();
        record.complexes.insert(
            kind,
            ComplexOwnership {
                kind,
                level,
                production: production_at(def, level).unwrap(),
                last_upgraded_at: now,
            },
        );
    }
    recompute_total_production(&mut record, now);
    record
}
