//! `PostgreSQL` implementation of the account store.
//!
//! Account mutations run inside one transaction that starts with
//! `SELECT ... FOR UPDATE` on the account row. Concurrent updates to the
//! same account therefore queue on the row lock, and a closure that fails
//! drops the transaction, which rolls everything back.

use std::collections::{BTreeMap, HashMap};

use atomic_types::{
    Account, AccountId, AccountRecord, ActiveBooster, BoosterKind, ComplexKind,
    ComplexOwnership, EventId, EventKind, GameEvent, LeaderboardEntry, RankingMetric,
    ResourceBundle,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::store::{AccountTx, Registration};

const ACCOUNT_COLUMNS: &str = "id, external_id, display_name, energons, neutrons, particles, \
     lifetime_energons, lifetime_neutrons, lifetime_particles, manual_clicks, \
     total_production_rate, production_multiplier, click_multiplier, booster_kind, \
     booster_started_at, booster_ends_at, next_satellite_at, daily_bonus_claimed, \
     bonus_streak, banned, created_at, updated_at";

type IdQuery<'q> = QueryAs<'q, Postgres, (Uuid,), PgArguments>;

const LEADERBOARD_COLUMNS: &str = "account_id, display_name, energons, neutrons, particles, \
     total_production, total_level, updated_at";

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

fn to_db(value: u64, column: &'static str) -> Result<i64, DbError> {
    i64::try_from(value).map_err(|e| DbError::OutOfRange {
        column,
        value,
        reason: e.to_string(),
    })
}

fn to_db_small(value: u32, column: &'static str) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|e| DbError::OutOfRange {
        column,
        value: u64::from(value),
        reason: e.to_string(),
    })
}

fn from_db(value: i64, column: &str) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|e| DbError::Corrupt(format!("{column} = {value}: {e}")))
}

fn from_db_small(value: i32, column: &str) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|e| DbError::Corrupt(format!("{column} = {value}: {e}")))
}

const fn metric_column(metric: RankingMetric) -> &'static str {
    match metric {
        RankingMetric::Energons => "energons",
        RankingMetric::Neutrons => "neutrons",
        RankingMetric::Particles => "particles",
        RankingMetric::Production => "total_production",
        RankingMetric::TotalLevel => "total_level",
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    external_id: i64,
    display_name: String,
    energons: i64,
    neutrons: i64,
    particles: i64,
    lifetime_energons: i64,
    lifetime_neutrons: i64,
    lifetime_particles: i64,
    manual_clicks: i64,
    total_production_rate: Decimal,
    production_multiplier: Decimal,
    click_multiplier: Decimal,
    booster_kind: Option<String>,
    booster_started_at: Option<DateTime<Utc>>,
    booster_ends_at: Option<DateTime<Utc>>,
    next_satellite_at: Option<DateTime<Utc>>,
    daily_bonus_claimed: bool,
    bonus_streak: i32,
    banned: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account, DbError> {
        let active_booster = match (self.booster_kind, self.booster_ends_at) {
            (Some(kind), Some(ends_at)) => Some(ActiveBooster {
                kind: kind
                    .parse::<BoosterKind>()
                    .map_err(|e| DbError::Corrupt(e.to_string()))?,
                started_at: self.booster_started_at.unwrap_or(ends_at),
                ends_at,
            }),
            _ => None,
        };

        Ok(Account {
            id: AccountId::from(self.id),
            external_id: self.external_id,
            display_name: self.display_name,
            balances: ResourceBundle::new(
                from_db(self.energons, "energons")?,
                from_db(self.neutrons, "neutrons")?,
                from_db(self.particles, "particles")?,
            ),
            lifetime: ResourceBundle::new(
                from_db(self.lifetime_energons, "lifetime_energons")?,
                from_db(self.lifetime_neutrons, "lifetime_neutrons")?,
                from_db(self.lifetime_particles, "lifetime_particles")?,
            ),
            manual_clicks: from_db(self.manual_clicks, "manual_clicks")?,
            total_production_rate: self.total_production_rate,
            production_multiplier: self.production_multiplier,
            click_multiplier: self.click_multiplier,
            active_booster,
            next_satellite_at: self.next_satellite_at,
            daily_bonus_claimed: self.daily_bonus_claimed,
            bonus_streak: from_db_small(self.bonus_streak, "bonus_streak")?,
            banned: self.banned,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ComplexRow {
    account_id: Uuid,
    kind: String,
    level: i32,
    production: Decimal,
    last_upgraded_at: DateTime<Utc>,
}

impl ComplexRow {
    fn into_ownership(self) -> Result<ComplexOwnership, DbError> {
        Ok(ComplexOwnership {
            kind: self
                .kind
                .parse::<ComplexKind>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            level: from_db_small(self.level, "level")?,
            production: self.production,
            last_upgraded_at: self.last_upgraded_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    account_id: Uuid,
    kind: String,
    energons: i64,
    neutrons: i64,
    particles: i64,
    detail: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Result<GameEvent, DbError> {
        Ok(GameEvent {
            id: EventId::from(self.id),
            account_id: AccountId::from(self.account_id),
            kind: self
                .kind
                .parse::<EventKind>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            amounts: ResourceBundle::new(
                from_db(self.energons, "energons")?,
                from_db(self.neutrons, "neutrons")?,
                from_db(self.particles, "particles")?,
            ),
            detail: self.detail,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeaderboardRow {
    account_id: Uuid,
    display_name: String,
    energons: i64,
    neutrons: i64,
    particles: i64,
    total_production: Decimal,
    total_level: i64,
    updated_at: DateTime<Utc>,
}

impl LeaderboardRow {
    fn into_entry(self) -> Result<LeaderboardEntry, DbError> {
        Ok(LeaderboardEntry {
            account_id: AccountId::from(self.account_id),
            display_name: self.display_name,
            energons: from_db(self.energons, "energons")?,
            neutrons: from_db(self.neutrons, "neutrons")?,
            particles: from_db(self.particles, "particles")?,
            total_production: self.total_production,
            total_level: from_db(self.total_level, "total_level")?,
            updated_at: self.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

async fn fetch_record(
    conn: &mut PgConnection,
    id: Uuid,
    for_update: bool,
) -> Result<Option<AccountRecord>, DbError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1{lock}"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let complexes = sqlx::query_as::<_, ComplexRow>(
        r"SELECT account_id, kind, level, production, last_upgraded_at
          FROM complex_ownership
          WHERE account_id = $1",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| row.into_ownership().map(|c| (c.kind, c)))
    .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(Some(AccountRecord {
        account: row.into_account()?,
        complexes,
    }))
}

async fn insert_account(conn: &mut PgConnection, account: &Account) -> Result<bool, DbError> {
    let inserted = sqlx::query(&format!(
        "INSERT INTO accounts ({ACCOUNT_COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                 $18, $19, $20, $21, $22)
         ON CONFLICT (external_id) DO NOTHING"
    ))
    .bind(account.id.into_inner())
    .bind(account.external_id)
    .bind(&account.display_name)
    .bind(to_db(account.balances.energons, "energons")?)
    .bind(to_db(account.balances.neutrons, "neutrons")?)
    .bind(to_db(account.balances.particles, "particles")?)
    .bind(to_db(account.lifetime.energons, "lifetime_energons")?)
    .bind(to_db(account.lifetime.neutrons, "lifetime_neutrons")?)
    .bind(to_db(account.lifetime.particles, "lifetime_particles")?)
    .bind(to_db(account.manual_clicks, "manual_clicks")?)
    .bind(account.total_production_rate)
    .bind(account.production_multiplier)
    .bind(account.click_multiplier)
    .bind(account.active_booster.map(|b| b.kind.as_str()))
    .bind(account.active_booster.map(|b| b.started_at))
    .bind(account.active_booster.map(|b| b.ends_at))
    .bind(account.next_satellite_at)
    .bind(account.daily_bonus_claimed)
    .bind(to_db_small(account.bonus_streak, "bonus_streak")?)
    .bind(account.banned)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(inserted.rows_affected() == 1)
}

async fn update_account_row(conn: &mut PgConnection, account: &Account) -> Result<(), DbError> {
    sqlx::query(
        r"UPDATE accounts SET
            display_name = $2,
            energons = $3, neutrons = $4, particles = $5,
            lifetime_energons = $6, lifetime_neutrons = $7, lifetime_particles = $8,
            manual_clicks = $9,
            total_production_rate = $10, production_multiplier = $11, click_multiplier = $12,
            booster_kind = $13, booster_started_at = $14, booster_ends_at = $15,
            next_satellite_at = $16, daily_bonus_claimed = $17, bonus_streak = $18,
            banned = $19, updated_at = $20
          WHERE id = $1",
    )
    .bind(account.id.into_inner())
    .bind(&account.display_name)
    .bind(to_db(account.balances.energons, "energons")?)
    .bind(to_db(account.balances.neutrons, "neutrons")?)
    .bind(to_db(account.balances.particles, "particles")?)
    .bind(to_db(account.lifetime.energons, "lifetime_energons")?)
    .bind(to_db(account.lifetime.neutrons, "lifetime_neutrons")?)
    .bind(to_db(account.lifetime.particles, "lifetime_particles")?)
    .bind(to_db(account.manual_clicks, "manual_clicks")?)
    .bind(account.total_production_rate)
    .bind(account.production_multiplier)
    .bind(account.click_multiplier)
    .bind(account.active_booster.map(|b| b.kind.as_str()))
    .bind(account.active_booster.map(|b| b.started_at))
    .bind(account.active_booster.map(|b| b.ends_at))
    .bind(account.next_satellite_at)
    .bind(account.daily_bonus_claimed)
    .bind(to_db_small(account.bonus_streak, "bonus_streak")?)
    .bind(account.banned)
    .bind(account.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_complexes(conn: &mut PgConnection, record: &AccountRecord) -> Result<(), DbError> {
    if record.complexes.is_empty() {
        return Ok(());
    }
    let len = record.complexes.len();
    let mut kinds = Vec::with_capacity(len);
    let mut levels = Vec::with_capacity(len);
    let mut productions = Vec::with_capacity(len);
    let mut upgraded = Vec::with_capacity(len);
    for owned in record.complexes.values() {
        kinds.push(owned.kind.as_str());
        levels.push(to_db_small(owned.level, "level")?);
        productions.push(owned.production);
        upgraded.push(owned.last_upgraded_at);
    }

    sqlx::query(
        r"INSERT INTO complex_ownership (account_id, kind, level, production, last_upgraded_at)
          SELECT $1, * FROM UNNEST($2::TEXT[], $3::INTEGER[], $4::NUMERIC[], $5::TIMESTAMPTZ[])
          ON CONFLICT (account_id, kind) DO UPDATE SET
            level = EXCLUDED.level,
            production = EXCLUDED.production,
            last_upgraded_at = EXCLUDED.last_upgraded_at",
    )
    .bind(record.account.id.into_inner())
    .bind(&kinds)
    .bind(&levels)
    .bind(&productions)
    .bind(&upgraded)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_events(conn: &mut PgConnection, events: &[GameEvent]) -> Result<(), DbError> {
    if events.is_empty() {
        return Ok(());
    }
    let len = events.len();
    let mut ids = Vec::with_capacity(len);
    let mut accounts = Vec::with_capacity(len);
    let mut kinds = Vec::with_capacity(len);
    let mut energons = Vec::with_capacity(len);
    let mut neutrons = Vec::with_capacity(len);
    let mut particles = Vec::with_capacity(len);
    let mut details = Vec::with_capacity(len);
    let mut timestamps = Vec::with_capacity(len);
    for event in events {
        ids.push(event.id.into_inner());
        accounts.push(event.account_id.into_inner());
        kinds.push(event.kind.as_str());
        energons.push(to_db(event.amounts.energons, "energons")?);
        neutrons.push(to_db(event.amounts.neutrons, "neutrons")?);
        particles.push(to_db(event.amounts.particles, "particles")?);
        details.push(event.detail.clone());
        timestamps.push(event.created_at);
    }

    sqlx::query(
        r"INSERT INTO game_events (id, account_id, kind, energons, neutrons, particles, detail, created_at)
          SELECT * FROM UNNEST($1::UUID[], $2::UUID[], $3::TEXT[], $4::BIGINT[], $5::BIGINT[], $6::BIGINT[], $7::JSONB[], $8::TIMESTAMPTZ[])",
    )
    .bind(&ids)
    .bind(&accounts)
    .bind(&kinds)
    .bind(&energons)
    .bind(&neutrons)
    .bind(&particles)
    .bind(&details)
    .bind(&timestamps)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Account store on `PostgreSQL`.
#[derive(Clone)]
pub struct PgGameStore {
    pool: PostgresPool,
}

impl PgGameStore {
    /// Wrap a connected pool. Migrations must already have run.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &PostgresPool {
        &self.pool
    }

    pub(crate) async fn register(
        &self,
        record: AccountRecord,
        created_event: GameEvent,
    ) -> Result<Registration, DbError> {
        let mut tx = self.pool.pool().begin().await?;

        if insert_account(&mut tx, &record.account).await? {
            upsert_complexes(&mut tx, &record).await?;
            insert_events(&mut tx, std::slice::from_ref(&created_event)).await?;
            tx.commit().await?;
            return Ok(Registration {
                record,
                created: true,
            });
        }

        let (id,): (Uuid,) = sqlx::query_as(
            r"UPDATE accounts SET display_name = $2 WHERE external_id = $1 RETURNING id",
        )
        .bind(record.account.external_id)
        .bind(&record.account.display_name)
        .fetch_one(&mut *tx)
        .await?;
        let existing = fetch_record(&mut tx, id, false)
            .await?
            .ok_or_else(|| DbError::AccountNotFound(AccountId::from(id)))?;
        tx.commit().await?;

        Ok(Registration {
            record: existing,
            created: false,
        })
    }

    pub(crate) async fn load(&self, id: AccountId) -> Result<Option<AccountRecord>, DbError> {
        let mut conn = self.pool.pool().acquire().await?;
        fetch_record(&mut conn, id.into_inner(), false).await
    }

    pub(crate) async fn find_by_external(
        &self,
        external_id: i64,
    ) -> Result<Option<AccountRecord>, DbError> {
        let mut conn = self.pool.pool().acquire().await?;
        let id: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM accounts WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&mut *conn)
            .await?;
        match id {
            Some((id,)) => fetch_record(&mut conn, id, false).await,
            None => Ok(None),
        }
    }

    pub(crate) async fn update_account<T, E, F>(&self, id: AccountId, apply: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&mut AccountTx) -> Result<T, E>,
    {
        let mut tx = self.pool.pool().begin().await.map_err(DbError::from)?;
        let record = fetch_record(&mut tx, id.into_inner(), true)
            .await?
            .ok_or(DbError::AccountNotFound(id))?;

        let mut account_tx = AccountTx::new(record);
        // An error here drops `tx`, which rolls back and releases the row lock.
        let out = apply(&mut account_tx)?;
        let (record, events) = account_tx.into_parts();

        update_account_row(&mut tx, &record.account).await?;
        upsert_complexes(&mut tx, &record).await?;
        insert_events(&mut tx, &events).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(out)
    }

    async fn ids(&self, query: IdQuery<'_>) -> Result<Vec<AccountId>, DbError> {
        let rows = query.fetch_all(self.pool.pool()).await?;
        Ok(rows.into_iter().map(|(id,)| AccountId::from(id)).collect())
    }

    pub(crate) async fn producing_accounts(&self) -> Result<Vec<AccountId>, DbError> {
        self.ids(sqlx::query_as(
            "SELECT id FROM accounts WHERE total_production_rate > 0 AND NOT banned",
        ))
        .await
    }

    pub(crate) async fn satellite_due(
        &self,
        satellite: ComplexKind,
        now: DateTime<Utc>,
    ) -> Result<Vec<AccountId>, DbError> {
        self.ids(
            sqlx::query_as(
                r"SELECT a.id FROM accounts a
                  JOIN complex_ownership c ON c.account_id = a.id AND c.kind = $1
                  WHERE NOT a.banned
                    AND (a.next_satellite_at IS NULL OR a.next_satellite_at <= $2)",
            )
            .bind(satellite.as_str())
            .bind(now),
        )
        .await
    }

    pub(crate) async fn expired_boosters(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<AccountId>, DbError> {
        self.ids(sqlx::query_as("SELECT id FROM accounts WHERE booster_ends_at <= $1").bind(now))
            .await
    }

    pub(crate) async fn reset_daily_flags(&self) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE accounts SET daily_bonus_claimed = FALSE WHERE daily_bonus_claimed",
        )
        .execute(self.pool.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub(crate) async fn scan_records(&self) -> Result<Vec<AccountRecord>, DbError> {
        let accounts =
            sqlx::query_as::<_, AccountRow>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts"))
                .fetch_all(self.pool.pool())
                .await?;
        let complexes = sqlx::query_as::<_, ComplexRow>(
            "SELECT account_id, kind, level, production, last_upgraded_at FROM complex_ownership",
        )
        .fetch_all(self.pool.pool())
        .await?;

        let mut owned: HashMap<Uuid, BTreeMap<ComplexKind, ComplexOwnership>> = HashMap::new();
        for row in complexes {
            let account_id = row.account_id;
            let ownership = row.into_ownership()?;
            owned
                .entry(account_id)
                .or_default()
                .insert(ownership.kind, ownership);
        }

        accounts
            .into_iter()
            .map(|row| {
                let complexes = owned.remove(&row.id).unwrap_or_default();
                Ok(AccountRecord {
                    account: row.into_account()?,
                    complexes,
                })
            })
            .collect()
    }

    pub(crate) async fn replace_leaderboard(
        &self,
        entries: &[LeaderboardEntry],
    ) -> Result<(), DbError> {
        let len = entries.len();
        let mut ids = Vec::with_capacity(len);
        let mut names = Vec::with_capacity(len);
        let mut energons = Vec::with_capacity(len);
        let mut neutrons = Vec::with_capacity(len);
        let mut particles = Vec::with_capacity(len);
        let mut production = Vec::with_capacity(len);
        let mut levels = Vec::with_capacity(len);
        let mut updated = Vec::with_capacity(len);
        for entry in entries {
            ids.push(entry.account_id.into_inner());
            names.push(entry.display_name.as_str());
            energons.push(to_db(entry.energons, "energons")?);
            neutrons.push(to_db(entry.neutrons, "neutrons")?);
            particles.push(to_db(entry.particles, "particles")?);
            production.push(entry.total_production);
            levels.push(to_db(entry.total_level, "total_level")?);
            updated.push(entry.updated_at);
        }

        let mut tx = self.pool.pool().begin().await?;
        sqlx::query("DELETE FROM leaderboard").execute(&mut *tx).await?;
        if len > 0 {
            sqlx::query(&format!(
                "INSERT INTO leaderboard ({LEADERBOARD_COLUMNS})
                 SELECT * FROM UNNEST($1::UUID[], $2::TEXT[], $3::BIGINT[], $4::BIGINT[],
                                      $5::BIGINT[], $6::NUMERIC[], $7::BIGINT[], $8::TIMESTAMPTZ[])"
            ))
            .bind(&ids)
            .bind(&names)
            .bind(&energons)
            .bind(&neutrons)
            .bind(&particles)
            .bind(&production)
            .bind(&levels)
            .bind(&updated)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(rows = len, "Leaderboard projection replaced");
        Ok(())
    }

    pub(crate) async fn leaderboard_top(
        &self,
        metric: RankingMetric,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, DbError> {
        let column = metric_column(metric);
        sqlx::query_as::<_, LeaderboardRow>(&format!(
            "SELECT {LEADERBOARD_COLUMNS} FROM leaderboard
             ORDER BY {column} DESC, account_id
             LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool.pool())
        .await?
        .into_iter()
        .map(LeaderboardRow::into_entry)
        .collect()
    }

    pub(crate) async fn leaderboard_entry(
        &self,
        id: AccountId,
    ) -> Result<Option<LeaderboardEntry>, DbError> {
        sqlx::query_as::<_, LeaderboardRow>(&format!(
            "SELECT {LEADERBOARD_COLUMNS} FROM leaderboard WHERE account_id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool.pool())
        .await?
        .map(LeaderboardRow::into_entry)
        .transpose()
    }

    pub(crate) async fn count_exceeding(
        &self,
        metric: RankingMetric,
        value: Decimal,
    ) -> Result<u64, DbError> {
        let column = metric_column(metric);
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM leaderboard WHERE {column} > $1"
        ))
        .bind(value)
        .fetch_one(self.pool.pool())
        .await?;
        from_db(count, "count")
    }

    pub(crate) async fn recent_events(
        &self,
        id: AccountId,
        limit: u32,
    ) -> Result<Vec<GameEvent>, DbError> {
        sqlx::query_as::<_, EventRow>(
            r"SELECT id, account_id, kind, energons, neutrons, particles, detail, created_at
              FROM game_events
              WHERE account_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(id.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.pool.pool())
        .await?
        .into_iter()
        .map(EventRow::into_event)
        .collect()
    }
}
