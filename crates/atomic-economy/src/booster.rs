//! The per-account booster state machine.
//!
//! ```text
//! Idle --activate(timed)--> Active --expire--> Idle
//! Idle/Active --activate(instant)--> (unchanged, resources granted)
//! ```
//!
//! [`expire_if_due`] is the only code that leaves `Active`. The periodic
//! sweep and every read that needs fresh multipliers go through it, so both
//! multipliers and the descriptor are always reset together.

use atomic_catalog::{BoosterEffect, Catalog, Prerequisite};
use atomic_ledger::wallet;
use atomic_types::{Account, AccountRecord, ActiveBooster, BoosterKind, ResourceBundle};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::EconomyError;
use crate::math::{after, mul};
use crate::production::passive_yield;

/// Booster slot state at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoosterState {
    /// No timed booster running.
    Idle,
    /// A timed booster running until its `ends_at`.
    Active(ActiveBooster),
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    /// The booster activated.
    pub kind: BoosterKind,
    /// The effect applied.
    pub effect: BoosterEffect,
    /// What was debited.
    pub cost: ResourceBundle,
    /// End of the timed effect; `None` for instant boosters.
    pub ends_at: Option<DateTime<Utc>>,
    /// Resources credited by an instant booster.
    pub granted: ResourceBundle,
}

/// One row of the booster list shown to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoosterOffer {
    /// Catalog key.
    pub kind: BoosterKind,
    /// Display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Activation cost.
    pub cost: ResourceBundle,
    /// Duration in seconds (0 for instant boosters).
    pub duration_secs: u64,
    /// Resolved effect.
    pub effect: BoosterEffect,
    /// Whether balances cover the cost.
    pub affordable: bool,
    /// Whether the prerequisite is met.
    pub unlocked: bool,
    /// The unmet prerequisite, if any.
    pub missing_prerequisite: Option<Prerequisite>,
}

/// Current slot state, treating a lapsed booster as already idle.
pub fn state(account: &Account, now: DateTime<Utc>) -> BoosterState {
    match account.active_booster {
        Some(active) if now < active.ends_at => BoosterState::Active(active),
        _ => BoosterState::Idle,
    }
}

/// Reset a lapsed booster. Returns the booster that expired, if any.
///
/// On expiry both multipliers return to 1 and the descriptor is cleared.
pub fn expire_if_due(account: &mut Account, now: DateTime<Utc>) -> Option<ActiveBooster> {
    let active = account.active_booster?;
    if now < active.ends_at {
        return None;
    }
    account.active_booster = None;
    account.production_multiplier = Decimal::ONE;
    account.click_multiplier = Decimal::ONE;
    account.updated_at = now;
    debug!(account = %account.id, booster = %active.kind, "Booster expired");
    Some(active)
}

fn unmet(record: &AccountRecord, prerequisite: Option<Prerequisite>) -> Option<Prerequisite> {
    prerequisite.filter(|p| record.level_of(p.kind) < p.level)
}

/// Every catalog booster with affordability and unlock state.
pub fn offers(record: &AccountRecord, catalog: &Catalog) -> Vec<BoosterOffer> {
    catalog
        .boosters()
        .map(|def| {
            let missing = unmet(record, def.prerequisite);
            BoosterOffer {
                kind: def.kind,
                name: def.name,
                description: def.description,
                cost: def.cost,
                duration_secs: def.duration_secs,
                effect: def.effect,
                affordable: wallet::can_afford(&record.account.balances, &def.cost),
                unlocked: missing.is_none(),
                missing_prerequisite: missing,
            }
        })
        .collect()
}

/// Activate booster `kind`.
///
/// # Order of checks
///
/// 1. Account not banned, booster exists
/// 2. A lapsed booster is expired first, on a staged copy
/// 3. Timed boosters need an idle slot
/// 4. Prerequisite met (checked on every activation)
/// 5. Balances cover the full cost
pub fn activate(
    record: &mut AccountRecord,
    catalog: &Catalog,
    kind: BoosterKind,
    now: DateTime<Utc>,
) -> Result<Activation, EconomyError> {
    crate::ensure_active(&record.account)?;
    let def = catalog
        .booster(kind)
        .ok_or(EconomyError::UnknownBooster(kind))?;
    // A lapsed booster frees the slot, but only a successful activation
    // keeps that expiry.
    let mut staged = record.clone();
    expire_if_due(&mut staged.account, now);

    if def.effect.is_timed()
        && let Some(active) = staged.account.active_booster
    {
        return Err(EconomyError::AlreadyActive {
            active: active.kind,
            ends_at: active.ends_at,
        });
    }
    if let Some(p) = unmet(&staged, def.prerequisite) {
        return Err(EconomyError::LockedPrerequisite {
            requires: p.kind,
            level: p.level,
            current: staged.level_of(p.kind),
        });
    }

    let account = &staged.account;
    let (production_multiplier, click_multiplier, ends_at, granted) = match def.effect {
        BoosterEffect::ProductionMultiplier { factor } => (
            mul(account.production_multiplier, factor, "production multiplier")?,
            account.click_multiplier,
            Some(after(now, def.duration_secs)?),
            ResourceBundle::ZERO,
        ),
        BoosterEffect::ClickMultiplier { factor } => (
            account.production_multiplier,
            mul(account.click_multiplier, factor, "click multiplier")?,
            Some(after(now, def.duration_secs)?),
            ResourceBundle::ZERO,
        ),
        BoosterEffect::Both { factor } => (
            mul(account.production_multiplier, factor, "production multiplier")?,
            mul(account.click_multiplier, factor, "click multiplier")?,
            Some(after(now, def.duration_secs)?),
            ResourceBundle::ZERO,
        ),
        BoosterEffect::InstantGrant { production_secs } => (
            account.production_multiplier,
            account.click_multiplier,
            None,
            passive_yield(&staged, catalog, production_secs)?,
        ),
    };

    let account = &mut staged.account;
    wallet::debit(account, &def.cost)?;
    wallet::credit(account, &granted)?;
    account.production_multiplier = production_multiplier;
    account.click_multiplier = click_multiplier;
    if let Some(ends_at) = ends_at {
        account.active_booster = Some(ActiveBooster {
            kind,
            started_at: now,
            ends_at,
        });
    }
    account.updated_at = now;
    *record = staged;

    debug!(account = %record.account.id, booster = %kind, "Booster activated");
    Ok(Activation {
        kind,
        effect: def.effect,
        cost: def.cost,
        ends_at,
        granted,
    })
}
