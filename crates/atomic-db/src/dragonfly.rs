//! `Dragonfly` (Redis-compatible) rank index.
//!
//! One sorted set per ranking metric mirrors the leaderboard projection so
//! rank lookups are `O(log n)` instead of a table scan. The sets are
//! rebuilt together with the projection and are never the source of truth.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `rank:{metric}` | Sorted set | account id scored by metric value |
//! | `rank:{metric}:staging` | Sorted set | rebuild target, renamed over `rank:{metric}` |

use atomic_types::{LeaderboardEntry, RankingMetric};
use fred::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::DbError;

/// Members written per `ZADD`.
const ZADD_CHUNK: usize = 500;

fn rank_key(metric: RankingMetric) -> String {
    format!("rank:{}", metric.as_str())
}

/// Sorted-set score for a metric value. Precision beyond `f64` is dropped.
fn score(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Connection handle to a `Dragonfly` instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at `redis://host:port[/db]`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Replace the rank set for `metric` with the given projection rows.
    ///
    /// Members are written to a staging key which is then renamed over the
    /// live key, so readers never see a half-built set.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if a write fails.
    pub async fn replace_rank(
        &self,
        metric: RankingMetric,
        entries: &[LeaderboardEntry],
    ) -> Result<(), DbError> {
        let key = rank_key(metric);
        if entries.is_empty() {
            let _: u32 = self.client.del(key.as_str()).await?;
            return Ok(());
        }

        let staging = format!("{key}:staging");
        let _: u32 = self.client.del(staging.as_str()).await?;

        let members: Vec<(f64, String)> = entries
            .iter()
            .map(|e| (score(e.metric_value(metric)), e.account_id.to_string()))
            .collect();
        for chunk in members.chunks(ZADD_CHUNK) {
            let _: i64 = self
                .client
                .zadd(staging.as_str(), None, None, false, false, chunk.to_vec())
                .await?;
        }
        let _: () = self.client.rename(staging.as_str(), key.as_str()).await?;

        tracing::debug!(metric = metric.as_str(), members = members.len(), "Rank index rebuilt");
        Ok(())
    }

    /// Number of members scoring strictly above `value` on `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn count_above(&self, metric: RankingMetric, value: Decimal) -> Result<u64, DbError> {
        let floor = score(value).next_up();
        let count: u64 = self
            .client
            .zcount(rank_key(metric).as_str(), floor, f64::INFINITY)
            .await?;
        Ok(count)
    }

    /// Number of members in the rank set for `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn members(&self, metric: RankingMetric) -> Result<u64, DbError> {
        let count: u64 = self.client.zcard(rank_key(metric).as_str()).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_metric_names() {
        assert_eq!(rank_key(RankingMetric::Energons), "rank:energons");
        assert_eq!(rank_key(RankingMetric::TotalLevel), "rank:total_level");
    }

    #[test]
    fn scores_convert_decimals() {
        assert!((score(Decimal::new(15, 1)) - 1.5).abs() < f64::EPSILON);
        assert!(score(Decimal::from(300)).next_up() > 300.0);
    }
}
