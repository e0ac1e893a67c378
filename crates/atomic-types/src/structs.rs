//! Core entity structs: accounts, complex ownership, events and the
//! leaderboard projection.
//!
//! These are plain data. Balance arithmetic lives in `atomic-ledger`,
//! formulas in `atomic-economy`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BoosterKind, ComplexKind, EventKind, RankingMetric, Resource};
use crate::ids::{AccountId, EventId};

// ---------------------------------------------------------------------------
// Resource bundle
// ---------------------------------------------------------------------------

/// An amount of each of the three currencies.
///
/// Used for balances, lifetime totals, costs and credits alike. Zero
/// components mean "not part of this amount".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourceBundle {
    /// Primary currency.
    pub energons: u64,
    /// Secondary currency.
    pub neutrons: u64,
    /// Prestige currency.
    pub particles: u64,
}

impl ResourceBundle {
    /// The empty bundle.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Build a bundle from its three components.
    pub const fn new(energons: u64, neutrons: u64, particles: u64) -> Self {
        Self {
            energons,
            neutrons,
            particles,
        }
    }

    /// A bundle holding only energons.
    pub const fn energons(amount: u64) -> Self {
        Self::new(amount, 0, 0)
    }

    /// Read one component.
    pub const fn get(&self, resource: Resource) -> u64 {
        match resource {
            Resource::Energons => self.energons,
            Resource::Neutrons => self.neutrons,
            Resource::Particles => self.particles,
        }
    }

    /// Mutable access to one component.
    pub const fn get_mut(&mut self, resource: Resource) -> &mut u64 {
        match resource {
            Resource::Energons => &mut self.energons,
            Resource::Neutrons => &mut self.neutrons,
            Resource::Particles => &mut self.particles,
        }
    }

    /// Whether every component is zero.
    pub const fn is_empty(&self) -> bool {
        self.energons == 0 && self.neutrons == 0 && self.particles == 0
    }

    /// Iterate over the non-zero components.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u64)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|resource| (resource, self.get(resource)))
            .filter(|(_, amount)| *amount > 0)
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// The booster currently occupying an account's single booster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveBooster {
    /// Which booster is running.
    pub kind: BoosterKind,
    /// When it was activated.
    pub started_at: DateTime<Utc>,
    /// When it stops applying.
    pub ends_at: DateTime<Utc>,
}

/// A player's persistent game state (everything except owned complexes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Account {
    /// Internal identifier.
    pub id: AccountId,
    /// Identity assigned by the chat front-end.
    pub external_id: i64,
    /// Name shown on the leaderboard.
    pub display_name: String,
    /// Spendable balances.
    pub balances: ResourceBundle,
    /// Everything ever credited, never decremented.
    pub lifetime: ResourceBundle,
    /// Number of manual clicks credited over the account's lifetime.
    pub manual_clicks: u64,
    /// Cached sum of owned complexes' production.
    #[ts(as = "String")]
    pub total_production_rate: Decimal,
    /// Multiplier on passive production (1 when no booster is active).
    #[ts(as = "String")]
    pub production_multiplier: Decimal,
    /// Multiplier on click power (1 when no booster is active).
    #[ts(as = "String")]
    pub click_multiplier: Decimal,
    /// The timed booster currently running, if any.
    pub active_booster: Option<ActiveBooster>,
    /// Earliest time the next satellite bonus may be paid.
    pub next_satellite_at: Option<DateTime<Utc>>,
    /// Whether today's daily bonus has been taken.
    pub daily_bonus_claimed: bool,
    /// Consecutive daily bonuses claimed.
    pub bonus_streak: u32,
    /// Moderation flag.
    pub banned: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

/// Ownership of one complex type by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ComplexOwnership {
    /// The complex type.
    pub kind: ComplexKind,
    /// Current level, at least 1.
    pub level: u32,
    /// Production per second at the current level.
    #[ts(as = "String")]
    pub production: Decimal,
    /// When the complex was bought or last upgraded.
    pub last_upgraded_at: DateTime<Utc>,
}

/// An account together with every complex it owns.
///
/// This is the unit of atomic read-modify-write: every balance-affecting
/// operation loads one record, mutates it, and commits it as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// The account row.
    pub account: Account,
    /// Owned complexes keyed by type. A type appears at most once.
    pub complexes: BTreeMap<ComplexKind, ComplexOwnership>,
}

impl AccountRecord {
    /// Current level of `kind`, or 0 if not owned.
    pub fn level_of(&self, kind: ComplexKind) -> u32 {
        self.complexes.get(&kind).map_or(0, |c| c.level)
    }

    /// Whether the account owns `kind`.
    pub fn owns(&self, kind: ComplexKind) -> bool {
        self.complexes.contains_key(&kind)
    }

    /// Sum of all owned levels.
    pub fn total_level(&self) -> u64 {
        self.complexes
            .values()
            .fold(0_u64, |acc, c| acc.saturating_add(u64::from(c.level)))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An append-only audit record of something that changed an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameEvent {
    /// Event identifier.
    pub id: EventId,
    /// The account the event belongs to.
    pub account_id: AccountId,
    /// What happened.
    pub kind: EventKind,
    /// Resources credited (or debited, for purchases) by the event.
    pub amounts: ResourceBundle,
    /// Kind-specific structured detail.
    pub detail: serde_json::Value,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// Denormalized ranking row for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// Account the row describes.
    pub account_id: AccountId,
    /// Display name at rebuild time.
    pub display_name: String,
    /// Primary balance at rebuild time.
    pub energons: u64,
    /// Secondary balance at rebuild time.
    pub neutrons: u64,
    /// Prestige balance at rebuild time.
    pub particles: u64,
    /// Total production rate at rebuild time.
    #[ts(as = "String")]
    pub total_production: Decimal,
    /// Sum of owned complex levels.
    pub total_level: u64,
    /// When the row was rebuilt.
    pub updated_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Project a leaderboard row out of a full account record.
    pub fn from_record(record: &AccountRecord, now: DateTime<Utc>) -> Self {
        let account = &record.account;
        Self {
            account_id: account.id,
            display_name: account.display_name.clone(),
            energons: account.balances.energons,
            neutrons: account.balances.neutrons,
            particles: account.balances.particles,
            total_production: account.total_production_rate,
            total_level: record.total_level(),
            updated_at: now,
        }
    }

    /// The value this row is ranked by under `metric`.
    pub fn metric_value(&self, metric: RankingMetric) -> Decimal {
        match metric {
            RankingMetric::Energons => Decimal::from(self.energons),
            RankingMetric::Neutrons => Decimal::from(self.neutrons),
            RankingMetric::Particles => Decimal::from(self.particles),
            RankingMetric::Production => self.total_production,
            RankingMetric::TotalLevel => Decimal::from(self.total_level),
        }
    }
}

/// A player's position on one leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RankPosition {
    /// The metric ranked by.
    pub metric: RankingMetric,
    /// 1-based position (1 + number of accounts strictly ahead).
    pub position: u64,
    /// The account's value on the metric.
    #[ts(as = "String")]
    pub value: Decimal,
}
