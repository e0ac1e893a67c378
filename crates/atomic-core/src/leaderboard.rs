//! The leaderboard projection.
//!
//! Rankings never read live account rows. [`Leaderboard::rebuild`] scans
//! every record, writes a denormalized row per account and, when a
//! Dragonfly rank index is configured, refreshes one sorted set per metric.
//! Between rebuilds the projection is stale.

use atomic_db::{DragonflyPool, GameStore};
use atomic_ledger::audit::{AuditResult, verify_production};
use atomic_types::{AccountRecord, LeaderboardEntry, RankPosition, RankingMetric};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::GameError;

/// Largest page [`Leaderboard::top`] returns.
pub const MAX_PAGE: u32 = 100;

/// Outcome of one [`Leaderboard::rebuild`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Rows written.
    pub entries: u64,
    /// Records whose cached production rate failed the audit.
    pub drifted: u64,
    /// Whether every rank set was refreshed.
    pub indexed: bool,
}

/// Read and rebuild access to the ranking projection.
#[derive(Clone)]
pub struct Leaderboard {
    store: GameStore,
    ranks: Option<DragonflyPool>,
}

impl Leaderboard {
    /// Wrap a store, with an optional rank index.
    pub const fn new(store: GameStore, ranks: Option<DragonflyPool>) -> Self {
        Self { store, ranks }
    }

    /// Whether a Dragonfly rank index is attached.
    pub const fn has_rank_index(&self) -> bool {
        self.ranks.is_some()
    }

    /// Recompute the projection from every account record.
    ///
    /// A rank-index failure is logged and leaves `indexed` false; position
    /// queries then fall back to the store.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Store`] if the scan or the projection write fails.
    pub async fn rebuild(&self, now: DateTime<Utc>) -> Result<RebuildSummary, GameError> {
        let records = self.store.scan_records().await?;

        let mut drifted = 0_u64;
        let entries: Vec<LeaderboardEntry> = records
            .iter()
            .map(|record| {
                if matches!(verify_production(record), AuditResult::Drift(_)) {
                    drifted = drifted.saturating_add(1);
                }
                LeaderboardEntry::from_record(record, now)
            })
            .collect();

        let mut indexed = self.ranks.is_some();
        if let Some(ranks) = &self.ranks {
            for metric in RankingMetric::ALL {
                if let Err(err) = ranks.replace_rank(metric, &entries).await {
                    warn!(metric = metric.as_str(), error = %err, "Rank index refresh failed");
                    indexed = false;
                }
            }
        }

        let count = u64::try_from(entries.len()).unwrap_or(u64::MAX);
        self.store.replace_leaderboard(entries).await?;

        info!(entries = count, drifted, indexed, "Leaderboard rebuilt");
        Ok(RebuildSummary {
            entries: count,
            drifted,
            indexed,
        })
    }

    /// The top rows by `metric`. `limit` is clamped to `1..=MAX_PAGE`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Store`] if the read fails.
    pub async fn top(
        &self,
        metric: RankingMetric,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, GameError> {
        Ok(self
            .store
            .leaderboard_top(metric, limit.clamp(1, MAX_PAGE))
            .await?)
    }

    /// Position of `record` on `metric`: one plus the number of projection
    /// rows strictly above its value.
    ///
    /// The value comes from the projection row when the account has one,
    /// otherwise from the live record, so a freshly registered account still
    /// gets a position before the next rebuild.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Store`] if the store read fails.
    pub async fn position_of(
        &self,
        record: &AccountRecord,
        metric: RankingMetric,
        now: DateTime<Utc>,
    ) -> Result<RankPosition, GameError> {
        let entry = self
            .store
            .leaderboard_entry(record.account.id)
            .await?
            .unwrap_or_else(|| LeaderboardEntry::from_record(record, now));
        let value = entry.metric_value(metric);

        let ahead = match &self.ranks {
            Some(ranks) => match ranks.count_above(metric, value).await {
                Ok(count) => count,
                Err(err) => {
                    warn!(metric = metric.as_str(), error = %err, "Rank index read failed, using store");
                    self.store.count_exceeding(metric, value).await?
                }
            },
            None => self.store.count_exceeding(metric, value).await?,
        };

        Ok(RankPosition {
            metric,
            position: ahead.saturating_add(1),
            value,
        })
    }
}
