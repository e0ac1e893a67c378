//! The account store seam.
//!
//! [`GameStore`] dispatches to one of two backends with identical
//! semantics. Every balance-affecting operation goes through
//! [`GameStore::update_account`], which hands the caller an exclusive
//! [`AccountTx`] for one account and commits the record together with the
//! events it emitted, or nothing at all.

use atomic_types::{
    AccountId, AccountRecord, ComplexKind, GameEvent, LeaderboardEntry, RankingMetric,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::DbError;
use crate::memory::MemoryStore;
use crate::pg_store::PgGameStore;

/// Largest page [`GameStore::recent_events`] is asked for. The in-memory
/// backend keeps no more than this many events per account.
pub const MAX_EVENT_PAGE: u32 = 200;

/// Exclusive working copy of one account inside a store transaction.
#[derive(Debug)]
pub struct AccountTx {
    /// The record being mutated. Written back on commit.
    pub record: AccountRecord,
    events: Vec<GameEvent>,
}

impl AccountTx {
    pub(crate) const fn new(record: AccountRecord) -> Self {
        Self {
            record,
            events: Vec::new(),
        }
    }

    /// Queue an event to be appended on commit.
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events queued so far.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub(crate) fn into_parts(self) -> (AccountRecord, Vec<GameEvent>) {
        (self.record, self.events)
    }
}

/// Outcome of [`GameStore::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    /// The stored record.
    pub record: AccountRecord,
    /// Whether the account was created by this call.
    pub created: bool,
}

/// The account store, backed by memory or `PostgreSQL`.
#[derive(Clone)]
pub enum GameStore {
    /// Process-local maps. Used by tests and single-node deployments.
    Memory(MemoryStore),
    /// `PostgreSQL` tables with row locks.
    Postgres(PgGameStore),
}

impl GameStore {
    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Insert `record` unless its external id is already registered.
    ///
    /// An existing account is returned with its display name refreshed;
    /// `created_event` is only appended for new accounts.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn register(
        &self,
        record: AccountRecord,
        created_event: GameEvent,
    ) -> Result<Registration, DbError> {
        match self {
            Self::Memory(store) => store.register(record, created_event).await,
            Self::Postgres(store) => store.register(record, created_event).await,
        }
    }

    /// Load an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn load(&self, id: AccountId) -> Result<Option<AccountRecord>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.load(id).await),
            Self::Postgres(store) => store.load(id).await,
        }
    }

    /// Load an account by its external (chat) identity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn find_by_external(
        &self,
        external_id: i64,
    ) -> Result<Option<AccountRecord>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.find_by_external(external_id).await),
            Self::Postgres(store) => store.find_by_external(external_id).await,
        }
    }

    /// Run `apply` against an exclusive copy of account `id`.
    ///
    /// Concurrent calls for the same account are serialized. If `apply`
    /// returns `Ok`, the mutated record and its emitted events are committed
    /// atomically; if it returns `Err`, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or [`DbError::AccountNotFound`] / a
    /// backend error converted into `E`.
    pub async fn update_account<T, E, F>(&self, id: AccountId, apply: F) -> Result<T, E>
    where
        T: Send,
        E: From<DbError> + Send,
        F: FnOnce(&mut AccountTx) -> Result<T, E> + Send,
    {
        match self {
            Self::Memory(store) => store.update_account(id, apply).await,
            Self::Postgres(store) => store.update_account(id, apply).await,
        }
    }

    /// Ids of unbanned accounts with a positive production rate.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn producing_accounts(&self) -> Result<Vec<AccountId>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.producing_accounts().await),
            Self::Postgres(store) => store.producing_accounts().await,
        }
    }

    /// Ids of unbanned accounts owning `satellite` whose next payout is due.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn satellite_due(
        &self,
        satellite: ComplexKind,
        now: DateTime<Utc>,
    ) -> Result<Vec<AccountId>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.satellite_due(satellite, now).await),
            Self::Postgres(store) => store.satellite_due(satellite, now).await,
        }
    }

    /// Ids of accounts whose booster ended at or before `now`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn expired_boosters(&self, now: DateTime<Utc>) -> Result<Vec<AccountId>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.expired_boosters(now).await),
            Self::Postgres(store) => store.expired_boosters(now).await,
        }
    }

    /// Clear every daily-bonus flag. Returns how many were set.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn reset_daily_flags(&self) -> Result<u64, DbError> {
        match self {
            Self::Memory(store) => Ok(store.reset_daily_flags().await),
            Self::Postgres(store) => store.reset_daily_flags().await,
        }
    }

    /// Every account record, for full-scan passes.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn scan_records(&self) -> Result<Vec<AccountRecord>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.scan_records().await),
            Self::Postgres(store) => store.scan_records().await,
        }
    }

    /// Replace the leaderboard projection wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn replace_leaderboard(&self, entries: Vec<LeaderboardEntry>) -> Result<(), DbError> {
        match self {
            Self::Memory(store) => {
                store.replace_leaderboard(entries).await;
                Ok(())
            }
            Self::Postgres(store) => store.replace_leaderboard(&entries).await,
        }
    }

    /// The top `limit` projection rows by `metric`, descending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn leaderboard_top(
        &self,
        metric: RankingMetric,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.leaderboard_top(metric, limit).await),
            Self::Postgres(store) => store.leaderboard_top(metric, limit).await,
        }
    }

    /// The projection row for one account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn leaderboard_entry(
        &self,
        id: AccountId,
    ) -> Result<Option<LeaderboardEntry>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.leaderboard_entry(id).await),
            Self::Postgres(store) => store.leaderboard_entry(id).await,
        }
    }

    /// Number of projection rows strictly above `value` on `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn count_exceeding(
        &self,
        metric: RankingMetric,
        value: Decimal,
    ) -> Result<u64, DbError> {
        match self {
            Self::Memory(store) => Ok(store.count_exceeding(metric, value).await),
            Self::Postgres(store) => store.count_exceeding(metric, value).await,
        }
    }

    /// The account's most recent events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    pub async fn recent_events(
        &self,
        id: AccountId,
        limit: u32,
    ) -> Result<Vec<GameEvent>, DbError> {
        match self {
            Self::Memory(store) => Ok(store.recent_events(id, limit).await),
            Self::Postgres(store) => store.recent_events(id, limit).await,
        }
    }
}
