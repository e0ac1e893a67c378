//! The game service: every operation the front-end and the scheduler call.
//!
//! Player-facing operations are addressed by the chat front-end's external
//! identity; scheduler operations by [`AccountId`]. Every balance-affecting
//! operation runs inside one [`GameStore::update_account`] call, so the
//! affordability check, the debit and the event append commit together or
//! not at all.

use std::sync::Arc;

use atomic_catalog::{Catalog, ComplexRole};
use atomic_db::{AccountTx, DragonflyPool, GameStore};
use atomic_economy::achievements::{self, Achievement};
use atomic_economy::booster::{self, Activation, BoosterOffer, BoosterState};
use atomic_economy::bonus::{self, DailyBonus, SatellitePayout};
use atomic_economy::click::{self, ClickCredit};
use atomic_economy::production::{self, Accrual};
use atomic_economy::progression::{self, LevelChange, UpgradeQuote};
use atomic_economy::EconomyRules;
use atomic_economy::account::seed_account;
use atomic_ledger::EventBuilder;
use atomic_ledger::audit::{AuditResult, verify_production};
use atomic_types::{
    AccountId, AccountRecord, ActiveBooster, BoosterKind, ComplexKind, EventKind, GameEvent,
    LeaderboardEntry, RankPosition, RankingMetric, Resource, ResourceBundle,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::click_buffer::{ClickBuffer, ClickReceipt, ClickSink};
use crate::clock::Clock;
use crate::error::GameError;
use crate::leaderboard::Leaderboard;

/// Largest event page [`GameService::get_events`] returns.
pub const MAX_EVENTS: u32 = atomic_db::MAX_EVENT_PAGE;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Per-second passive production of each resource, after bonuses and the
/// production multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceRates {
    /// Energons per second.
    pub energons: Decimal,
    /// Neutrons per second.
    pub neutrons: Decimal,
    /// Particles per second.
    pub particles: Decimal,
}

/// Everything the front-end shows on the main screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStatus {
    /// Internal identifier.
    pub account_id: AccountId,
    /// Chat identity.
    pub external_id: i64,
    /// Leaderboard name.
    pub display_name: String,
    /// Spendable balances.
    pub balances: ResourceBundle,
    /// Everything ever credited.
    pub lifetime: ResourceBundle,
    /// Manual clicks credited so far.
    pub manual_clicks: u64,
    /// Energons per manual click, exact.
    pub click_power: Decimal,
    /// Sum of owned complexes' base production.
    pub total_production: Decimal,
    /// Effective per-resource rates.
    pub rates: ResourceRates,
    /// Current production multiplier.
    pub production_multiplier: Decimal,
    /// Current click multiplier.
    pub click_multiplier: Decimal,
    /// The running timed booster, if any.
    pub active_booster: Option<ActiveBooster>,
    /// When the satellite pays next (`None`: never scheduled).
    pub next_satellite_at: Option<DateTime<Utc>>,
    /// Whether today's daily bonus is taken.
    pub daily_bonus_claimed: bool,
    /// Consecutive daily bonuses.
    pub bonus_streak: u32,
    /// Moderation flag.
    pub banned: bool,
}

/// Result of [`GameService::register_account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registered {
    /// Whether this call created the account.
    pub created: bool,
    /// The account's status.
    pub status: AccountStatus,
}

/// The booster screen: the running booster and every catalog offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoosterBoard {
    /// The running timed booster, if any.
    pub active: Option<ActiveBooster>,
    /// One offer per catalog booster.
    pub offers: Vec<BoosterOffer>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Shared handle to the game engine. Cheap to clone.
#[derive(Clone)]
pub struct GameService {
    store: GameStore,
    catalog: Arc<Catalog>,
    rules: Arc<EconomyRules>,
    clock: Arc<dyn Clock>,
    leaderboard: Leaderboard,
}

impl GameService {
    /// Build a service over `store`.
    pub fn new(
        store: GameStore,
        catalog: Arc<Catalog>,
        rules: EconomyRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let leaderboard = Leaderboard::new(store.clone(), None);
        Self {
            store,
            catalog,
            rules: Arc::new(rules),
            clock,
            leaderboard,
        }
    }

    /// Attach a Dragonfly rank index to the leaderboard.
    #[must_use]
    pub fn with_rank_index(mut self, ranks: DragonflyPool) -> Self {
        self.leaderboard = Leaderboard::new(self.store.clone(), Some(ranks));
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &GameStore {
        &self.store
    }

    /// The catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The leaderboard projection.
    pub const fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// The current time according to the service clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Account lifecycle
    // -----------------------------------------------------------------------

    /// Get-or-create the account for a chat identity.
    ///
    /// A new account gets the starting balance and the base producer at
    /// level 1. An existing one keeps its state; only the display name is
    /// refreshed.
    pub async fn register_account(
        &self,
        external_id: i64,
        display_name: &str,
    ) -> Result<Registered, GameError> {
        let now = self.now();
        let name = match display_name.trim() {
            "" => format!("comrade-{external_id}"),
            trimmed => trimmed.to_owned(),
        };

        let record = seed_account(external_id, &name, &self.catalog, &self.rules, now)?;
        let starter: Vec<ComplexKind> = record.complexes.keys().copied().collect();
        let created_event = EventBuilder::new(record.account.id, EventKind::AccountCreated)
            .amounts(record.account.balances)
            .detail(json!({ "display_name": name, "complexes": starter }))
            .at(now)
            .build()?;

        let registration = self.store.register(record, created_event).await?;
        if registration.created {
            info!(
                account = %registration.record.account.id,
                external_id,
                "Account registered"
            );
        }
        Ok(Registered {
            created: registration.created,
            status: self.status_of(&registration.record)?,
        })
    }

    /// Current status, with any lapsed booster expired first.
    pub async fn get_status(&self, external_id: i64) -> Result<AccountStatus, GameError> {
        let record = self.fresh_record(external_id).await?;
        self.status_of(&record)
    }

    /// Toggle the moderation flag. Returns whether it changed.
    pub async fn set_banned(&self, external_id: i64, banned: bool) -> Result<bool, GameError> {
        let changed = self
            .mutate(external_id, move |tx, _, _, now| {
                if tx.record.account.banned == banned {
                    return Ok(false);
                }
                tx.record.account.banned = banned;
                tx.record.account.updated_at = now;
                record_event(
                    tx,
                    EventKind::BanChanged,
                    ResourceBundle::ZERO,
                    json!({ "banned": banned }),
                    now,
                )?;
                Ok(true)
            })
            .await?;
        if changed {
            info!(external_id, banned, "Moderation flag changed");
        }
        Ok(changed)
    }

    /// The account's most recent events, newest first.
    pub async fn get_events(
        &self,
        external_id: i64,
        limit: u32,
    ) -> Result<Vec<GameEvent>, GameError> {
        let record = self.record_of(external_id).await?;
        Ok(self
            .store
            .recent_events(record.account.id, limit.clamp(1, MAX_EVENTS))
            .await?)
    }

    /// Achievement progress derived from current state.
    pub async fn get_achievements(&self, external_id: i64) -> Result<Vec<Achievement>, GameError> {
        let record = self.record_of(external_id).await?;
        Ok(achievements::achievements(&record, &self.catalog))
    }

    // -----------------------------------------------------------------------
    // Complexes
    // -----------------------------------------------------------------------

    /// A quote for the next level of every catalog complex.
    pub async fn list_complexes(&self, external_id: i64) -> Result<Vec<UpgradeQuote>, GameError> {
        let record = self.record_of(external_id).await?;
        Ok(progression::quote_all(&record, &self.catalog)?)
    }

    /// Buy the first level of `kind`.
    pub async fn purchase(
        &self,
        external_id: i64,
        kind: ComplexKind,
    ) -> Result<LevelChange, GameError> {
        let change = self
            .mutate(external_id, move |tx, catalog, _, now| {
                let change = progression::purchase(&mut tx.record, catalog, kind, now)?;
                audit(&tx.record)?;
                record_event(
                    tx,
                    EventKind::ComplexPurchased,
                    change.cost,
                    json!({ "complex": kind, "level": change.level }),
                    now,
                )?;
                Ok(change)
            })
            .await?;
        info!(external_id, complex = %kind, rate = %change.total_production_rate, "Complex purchased");
        Ok(change)
    }

    /// Raise an owned complex by one level.
    pub async fn upgrade(
        &self,
        external_id: i64,
        kind: ComplexKind,
    ) -> Result<LevelChange, GameError> {
        let change = self
            .mutate(external_id, move |tx, catalog, _, now| {
                let change = progression::upgrade(&mut tx.record, catalog, kind, now)?;
                audit(&tx.record)?;
                record_event(
                    tx,
                    EventKind::ComplexUpgraded,
                    change.cost,
                    json!({ "complex": kind, "level": change.level }),
                    now,
                )?;
                Ok(change)
            })
            .await?;
        info!(
            external_id,
            complex = %kind,
            level = change.level,
            rate = %change.total_production_rate,
            "Complex upgraded"
        );
        Ok(change)
    }

    // -----------------------------------------------------------------------
    // Boosters
    // -----------------------------------------------------------------------

    /// The running booster and every offer, with affordability.
    pub async fn list_boosters(&self, external_id: i64) -> Result<BoosterBoard, GameError> {
        let record = self.fresh_record(external_id).await?;
        Ok(BoosterBoard {
            active: record.account.active_booster,
            offers: booster::offers(&record, &self.catalog),
        })
    }

    /// Activate a booster.
    pub async fn activate_booster(
        &self,
        external_id: i64,
        kind: BoosterKind,
    ) -> Result<Activation, GameError> {
        let activation = self
            .mutate(external_id, move |tx, catalog, _, now| {
                expire_recorded(tx, now)?;
                let activation = booster::activate(&mut tx.record, catalog, kind, now)?;
                match activation.ends_at {
                    Some(ends_at) => record_event(
                        tx,
                        EventKind::BoosterActivated,
                        activation.cost,
                        json!({ "booster": kind, "effect": activation.effect, "ends_at": ends_at }),
                        now,
                    )?,
                    None => record_event(
                        tx,
                        EventKind::InstantGrant,
                        activation.granted,
                        json!({ "booster": kind, "cost": activation.cost }),
                        now,
                    )?,
                }
                Ok(activation)
            })
            .await?;
        info!(external_id, booster = %kind, ends_at = ?activation.ends_at, "Booster activated");
        Ok(activation)
    }

    /// Expire the account's booster if it has lapsed.
    pub async fn expire_booster(&self, id: AccountId) -> Result<Option<ActiveBooster>, GameError> {
        self.mutate_id(id, |tx, _, _, now| expire_recorded(tx, now))
            .await
    }

    // -----------------------------------------------------------------------
    // Bonuses
    // -----------------------------------------------------------------------

    /// Claim today's daily bonus.
    pub async fn claim_daily_bonus(&self, external_id: i64) -> Result<DailyBonus, GameError> {
        let bonus = self
            .mutate(external_id, |tx, _, rules, now| {
                let bonus = bonus::claim_daily(&mut tx.record.account, rules, now)?;
                record_event(
                    tx,
                    EventKind::DailyBonus,
                    ResourceBundle::energons(bonus.amount),
                    json!({ "streak": bonus.streak }),
                    now,
                )?;
                Ok(bonus)
            })
            .await?;
        info!(external_id, streak = bonus.streak, amount = bonus.amount, "Daily bonus claimed");
        Ok(bonus)
    }

    /// Pay the satellite bonus if the account is due one.
    pub async fn pay_satellite(&self, id: AccountId) -> Result<Option<SatellitePayout>, GameError> {
        self.mutate_id(id, |tx, catalog, _, now| {
            let Some(payout) = bonus::pay_satellite(&mut tx.record, catalog, now)? else {
                return Ok(None);
            };
            if payout.amount > 0 {
                record_event(
                    tx,
                    EventKind::SatelliteBonus,
                    ResourceBundle::energons(payout.amount),
                    json!({ "complex": payout.kind, "level": payout.level, "next_at": payout.next_at }),
                    now,
                )?;
            }
            Ok(Some(payout))
        })
        .await
    }

    /// The complex whose role is the periodic satellite payout.
    pub fn satellite_kind(&self) -> Option<ComplexKind> {
        self.catalog
            .find_role(|role| matches!(role, ComplexRole::Satellite { .. }))
            .map(|def| def.kind)
    }

    // -----------------------------------------------------------------------
    // Production and clicks
    // -----------------------------------------------------------------------

    /// Credit `secs` seconds of passive production and labor automation.
    pub async fn accrue_production(&self, id: AccountId, secs: u64) -> Result<Accrual, GameError> {
        self.mutate_id(id, move |tx, catalog, rules, now| {
            expire_recorded(tx, now)?;
            let accrual = production::accrue(&mut tx.record, catalog, rules, secs, now)?;
            if !accrual.total.is_empty() {
                record_event(
                    tx,
                    EventKind::Production,
                    accrual.total,
                    json!({ "secs": secs, "automation_clicks": accrual.automation_clicks }),
                    now,
                )?;
            }
            Ok(accrual)
        })
        .await
    }

    /// Credit a batch of manual clicks at the account's current click power.
    pub async fn credit_clicks(&self, id: AccountId, clicks: u64) -> Result<ClickCredit, GameError> {
        if clicks == 0 {
            return Err(GameError::NoClicks);
        }
        let credit = self
            .mutate_id(id, move |tx, catalog, rules, now| {
                expire_recorded(tx, now)?;
                let credit = click::credit_clicks(&mut tx.record, catalog, rules, clicks, now)?;
                if credit.credited > 0 {
                    record_event(
                        tx,
                        EventKind::ManualClick,
                        ResourceBundle::energons(credit.credited),
                        json!({ "clicks": clicks, "power": credit.power }),
                        now,
                    )?;
                }
                Ok(credit)
            })
            .await?;
        debug!(account = %id, clicks, credited = credit.credited, "Clicks credited");
        Ok(credit)
    }

    /// Buffer manual clicks for the account; the buffer decides when to
    /// credit them.
    pub async fn record_manual_click(
        &self,
        buffer: &ClickBuffer<Self>,
        external_id: i64,
        clicks: u64,
    ) -> Result<ClickReceipt, GameError> {
        let record = self.record_of(external_id).await?;
        atomic_economy::ensure_active(&record.account)?;
        buffer.record(record.account.id, clicks).await
    }

    // -----------------------------------------------------------------------
    // Rankings
    // -----------------------------------------------------------------------

    /// The top `limit` projection rows by `metric`.
    pub async fn get_leaderboard(
        &self,
        metric: RankingMetric,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, GameError> {
        self.leaderboard.top(metric, limit).await
    }

    /// The account's position on `metric`.
    pub async fn get_rank(
        &self,
        external_id: i64,
        metric: RankingMetric,
    ) -> Result<RankPosition, GameError> {
        let record = self.record_of(external_id).await?;
        self.leaderboard
            .position_of(&record, metric, self.now())
            .await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn record_of(&self, external_id: i64) -> Result<AccountRecord, GameError> {
        self.store
            .find_by_external(external_id)
            .await?
            .ok_or(GameError::AccountNotFound { external_id })
    }

    /// Load the record, expiring a lapsed booster (and persisting that)
    /// before returning it.
    async fn fresh_record(&self, external_id: i64) -> Result<AccountRecord, GameError> {
        let record = self.record_of(external_id).await?;
        let lapsed = record.account.active_booster.is_some()
            && booster::state(&record.account, self.now()) == BoosterState::Idle;
        if !lapsed {
            return Ok(record);
        }
        self.mutate_id(record.account.id, |tx, _, _, now| {
            expire_recorded(tx, now)?;
            Ok(tx.record.clone())
        })
        .await
    }

    fn status_of(&self, record: &AccountRecord) -> Result<AccountStatus, GameError> {
        let rate = |resource: Resource| production::passive_rate(record, &self.catalog, resource);
        let account = &record.account;
        Ok(AccountStatus {
            account_id: account.id,
            external_id: account.external_id,
            display_name: account.display_name.clone(),
            balances: account.balances,
            lifetime: account.lifetime,
            manual_clicks: account.manual_clicks,
            click_power: click::click_power(record, &self.catalog, &self.rules)?,
            total_production: account.total_production_rate,
            rates: ResourceRates {
                energons: rate(Resource::Energons)?,
                neutrons: rate(Resource::Neutrons)?,
                particles: rate(Resource::Particles)?,
            },
            production_multiplier: account.production_multiplier,
            click_multiplier: account.click_multiplier,
            active_booster: account.active_booster,
            next_satellite_at: account.next_satellite_at,
            daily_bonus_claimed: account.daily_bonus_claimed,
            bonus_streak: account.bonus_streak,
            banned: account.banned,
        })
    }

    async fn mutate<T, F>(&self, external_id: i64, apply: F) -> Result<T, GameError>
    where
        T: Send,
        F: FnOnce(&mut AccountTx, &Catalog, &EconomyRules, DateTime<Utc>) -> Result<T, GameError>
            + Send,
    {
        let record = self.record_of(external_id).await?;
        self.mutate_id(record.account.id, apply).await
    }

    async fn mutate_id<T, F>(&self, id: AccountId, apply: F) -> Result<T, GameError>
    where
        T: Send,
        F: FnOnce(&mut AccountTx, &Catalog, &EconomyRules, DateTime<Utc>) -> Result<T, GameError>
            + Send,
    {
        let now = self.now();
        let catalog: &Catalog = &self.catalog;
        let rules: &EconomyRules = &self.rules;
        self.store
            .update_account(id, move |tx| apply(tx, catalog, rules, now))
            .await
    }
}

impl ClickSink for GameService {
    async fn credit(&self, account: AccountId, clicks: u64) -> Result<ClickCredit, GameError> {
        self.credit_clicks(account, clicks).await
    }
}

/// Build an event for the account in `tx` and queue it for commit.
fn record_event(
    tx: &mut AccountTx,
    kind: EventKind,
    amounts: ResourceBundle,
    detail: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<(), GameError> {
    let event = EventBuilder::new(tx.record.account.id, kind)
        .amounts(amounts)
        .detail(detail)
        .at(now)
        .build()?;
    tx.emit(event);
    Ok(())
}

/// Run the booster expiry check and record the transition if it fired.
fn expire_recorded(
    tx: &mut AccountTx,
    now: DateTime<Utc>,
) -> Result<Option<ActiveBooster>, GameError> {
    let expired = booster::expire_if_due(&mut tx.record.account, now);
    if let Some(lapsed) = expired {
        record_event(
            tx,
            EventKind::BoosterExpired,
            ResourceBundle::ZERO,
            json!({ "booster": lapsed.kind, "ended_at": lapsed.ends_at }),
            now,
        )?;
    }
    Ok(expired)
}

fn audit(record: &AccountRecord) -> Result<(), GameError> {
    match verify_production(record) {
        AuditResult::Consistent => Ok(()),
        AuditResult::Drift(drift) => Err(GameError::Audit(drift)),
    }
}
