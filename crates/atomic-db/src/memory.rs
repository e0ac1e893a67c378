//! In-memory account store.
//!
//! Each account lives behind its own [`tokio::sync::Mutex`], so updates to
//! one account serialize while different accounts proceed in parallel.
//! Updates work on a clone and swap it in only on success.
//!
//! Event history is a ring of the newest [`MAX_EVENT_PAGE`] events per
//! account; older ones are dropped on append.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use atomic_types::{
    AccountId, AccountRecord, ComplexKind, GameEvent, LeaderboardEntry, RankingMetric,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};

use crate::error::DbError;
use crate::store::{AccountTx, MAX_EVENT_PAGE, Registration};

type Slot = Arc<Mutex<AccountRecord>>;

const EVENT_RETENTION: usize = MAX_EVENT_PAGE as usize;

#[derive(Default)]
struct Inner {
    accounts: RwLock<HashMap<AccountId, Slot>>,
    by_external: RwLock<HashMap<i64, AccountId>>,
    events: RwLock<HashMap<AccountId, VecDeque<GameEvent>>>,
    leaderboard: RwLock<Vec<LeaderboardEntry>>,
}

/// Process-local account store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: AccountId) -> Option<Slot> {
        self.inner.accounts.read().await.get(&id).cloned()
    }

    async fn append_events(&self, id: AccountId, events: Vec<GameEvent>) {
        if events.is_empty() {
            return;
        }
        let mut all = self.inner.events.write().await;
        let history = all.entry(id).or_default();
        history.extend(events);
        while history.len() > EVENT_RETENTION {
            history.pop_front();
        }
    }

    /// Events currently retained for `id`.
    pub async fn retained_events(&self, id: AccountId) -> usize {
        self.inner
            .events
            .read()
            .await
            .get(&id)
            .map_or(0, VecDeque::len)
    }

    pub(crate) async fn register(
        &self,
        record: AccountRecord,
        created_event: GameEvent,
    ) -> Result<Registration, DbError> {
        // Holding the external-id index for the whole call makes
        // get-or-create atomic.
        let mut by_external = self.inner.by_external.write().await;
        if let Some(existing) = by_external.get(&record.account.external_id).copied() {
            let slot = self
                .slot(existing)
                .await
                .ok_or(DbError::AccountNotFound(existing))?;
            let mut stored = slot.lock().await;
            stored.account.display_name.clone_from(&record.account.display_name);
            return Ok(Registration {
                record: stored.clone(),
                created: false,
            });
        }

        let id = record.account.id;
        by_external.insert(record.account.external_id, id);
        self.inner
            .accounts
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(record.clone())));
        drop(by_external);
        self.append_events(id, vec![created_event]).await;

        Ok(Registration {
            record,
            created: true,
        })
    }

    pub(crate) async fn load(&self, id: AccountId) -> Option<AccountRecord> {
        let slot = self.slot(id).await?;
        let record = slot.lock().await.clone();
        Some(record)
    }

    pub(crate) async fn find_by_external(&self, external_id: i64) -> Option<AccountRecord> {
        let id = self.inner.by_external.read().await.get(&external_id).copied()?;
        self.load(id).await
    }

    pub(crate) async fn update_account<T, E, F>(&self, id: AccountId, apply: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&mut AccountTx) -> Result<T, E>,
    {
        let slot = self.slot(id).await.ok_or(DbError::AccountNotFound(id))?;
        let mut stored = slot.lock().await;

        let mut tx = AccountTx::new(stored.clone());
        let out = apply(&mut tx)?;
        let (record, events) = tx.into_parts();
        *stored = record;
        // Events are appended while the account lock is still held so they
        // stay in commit order.
        self.append_events(id, events).await;
        drop(stored);
        Ok(out)
    }

    /// Snapshot every record, taking each account lock briefly.
    async fn snapshot(&self) -> Vec<AccountRecord> {
        let slots: Vec<Slot> = self.inner.accounts.read().await.values().cloned().collect();
        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            records.push(slot.lock().await.clone());
        }
        records
    }

    async fn select(&self, keep: impl Fn(&AccountRecord) -> bool) -> Vec<AccountId> {
        self.snapshot()
            .await
            .into_iter()
            .filter(keep)
            .map(|r| r.account.id)
            .collect()
    }

    pub(crate) async fn producing_accounts(&self) -> Vec<AccountId> {
        self.select(|r| !r.account.banned && r.account.total_production_rate > Decimal::ZERO)
            .await
    }

    pub(crate) async fn satellite_due(
        &self,
        satellite: ComplexKind,
        now: DateTime<Utc>,
    ) -> Vec<AccountId> {
        self.select(|r| {
            !r.account.banned
                && r.level_of(satellite) > 0
                && r.account.next_satellite_at.is_none_or(|at| at <= now)
        })
        .await
    }

    pub(crate) async fn expired_boosters(&self, now: DateTime<Utc>) -> Vec<AccountId> {
        self.select(|r| r.account.active_booster.is_some_and(|b| b.ends_at <= now))
            .await
    }

    pub(crate) async fn reset_daily_flags(&self) -> u64 {
        let slots: Vec<Slot> = self.inner.accounts.read().await.values().cloned().collect();
        let mut reset = 0_u64;
        for slot in slots {
            let mut record = slot.lock().await;
            if record.account.daily_bonus_claimed {
                record.account.daily_bonus_claimed = false;
                reset = reset.saturating_add(1);
            }
        }
        reset
    }

    pub(crate) async fn scan_records(&self) -> Vec<AccountRecord> {
        self.snapshot().await
    }

    pub(crate) async fn replace_leaderboard(&self, entries: Vec<LeaderboardEntry>) {
        *self.inner.leaderboard.write().await = entries;
    }

    pub(crate) async fn leaderboard_top(
        &self,
        metric: RankingMetric,
        limit: u32,
    ) -> Vec<LeaderboardEntry> {
        let mut rows = self.inner.leaderboard.read().await.clone();
        rows.sort_by(|a, b| {
            b.metric_value(metric)
                .cmp(&a.metric_value(metric))
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        rows
    }

    pub(crate) async fn leaderboard_entry(&self, id: AccountId) -> Option<LeaderboardEntry> {
        self.inner
            .leaderboard
            .read()
            .await
            .iter()
            .find(|e| e.account_id == id)
            .cloned()
    }

    pub(crate) async fn count_exceeding(&self, metric: RankingMetric, value: Decimal) -> u64 {
        let above = self
            .inner
            .leaderboard
            .read()
            .await
            .iter()
            .filter(|e| e.metric_value(metric) > value)
            .count();
        u64::try_from(above).unwrap_or(u64::MAX)
    }

    pub(crate) async fn recent_events(&self, id: AccountId, limit: u32) -> Vec<GameEvent> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        self.inner
            .events
            .read()
            .await
            .get(&id)
            .map(|events| events.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}
