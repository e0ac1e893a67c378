//! Per-account batching of manual clicks.
//!
//! Rapid clicking would otherwise mean one store write per click. The
//! buffer accumulates clicks per account and hands a whole batch to a
//! [`ClickSink`] when either trigger fires:
//!
//! - the pending count reaches the burst threshold, or
//! - at least the window has passed since the first click of the batch.
//!
//! [`run_sweep`] flushes stale buffers that receive no further clicks, and
//! [`ClickBuffer::shutdown`] drains everything before the process exits.
//! The map only holds accounts with clicks pending.
//! Buffered clicks are not durable; a crash loses at most one window.
//!
//! The pending map lock is never held across a sink call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use atomic_economy::click::ClickCredit;
use atomic_types::AccountId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::ClickBufferConfig;
use crate::error::GameError;
use crate::shutdown::ShutdownState;

/// Where flushed clicks are credited.
pub trait ClickSink: Send + Sync + 'static {
    /// Credit `clicks` clicks to `account` in one atomic update.
    fn credit(
        &self,
        account: AccountId,
        clicks: u64,
    ) -> impl Future<Output = Result<ClickCredit, GameError>> + Send;
}

/// What happened to one [`ClickBuffer::record`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClickReceipt {
    /// Clicks accepted by this call.
    pub accepted: u64,
    /// Clicks still buffered for the account afterwards.
    pub pending: u64,
    /// The credit, if this call triggered a flush.
    pub flushed: Option<ClickCredit>,
}

/// Totals for a multi-account flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Accounts credited.
    pub accounts: u64,
    /// Clicks credited.
    pub clicks: u64,
    /// Energons credited.
    pub credited: u64,
    /// Accounts whose credit failed.
    pub failed: u64,
}

/// A non-empty buffer. Entries are removed as soon as they are drained.
#[derive(Debug, Clone, Copy)]
struct Pending {
    count: u64,
    window_start: DateTime<Utc>,
}

/// Process-local click accumulator.
pub struct ClickBuffer<S> {
    sink: S,
    clock: Arc<dyn Clock>,
    burst_threshold: u64,
    window: TimeDelta,
    pending: Mutex<HashMap<AccountId, Pending>>,
}

impl<S: ClickSink> ClickBuffer<S> {
    /// Create an empty buffer.
    pub fn new(sink: S, config: &ClickBufferConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink,
            clock,
            burst_threshold: config.burst_threshold.max(1),
            window: TimeDelta::from_std(config.window()).unwrap_or(TimeDelta::MAX),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// The sink batches are credited to.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Add `clicks` to the account's buffer and flush if a trigger fires.
    ///
    /// One call carries at most one burst, so a single request can never
    /// credit more than one batch.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoClicks`] for a zero count,
    /// [`GameError::TooManyClicks`] above the burst threshold, or the sink's
    /// error if a triggered flush fails.
    pub async fn record(&self, account: AccountId, clicks: u64) -> Result<ClickReceipt, GameError> {
        if clicks == 0 {
            return Err(GameError::NoClicks);
        }
        if clicks > self.burst_threshold {
            return Err(GameError::TooManyClicks {
                requested: clicks,
                max: self.burst_threshold,
            });
        }
        let now = self.clock.now();

        let (due, pending) = {
            let mut buffers = self.pending.lock().await;
            let entry = buffers.entry(account).or_insert(Pending {
                count: 0,
                window_start: now,
            });
            entry.count = entry.count.saturating_add(clicks);
            let triggered = entry.count >= self.burst_threshold
                || now.signed_duration_since(entry.window_start) >= self.window;
            if triggered {
                let count = entry.count;
                buffers.remove(&account);
                (Some(count), 0)
            } else {
                (None, entry.count)
            }
        };

        let flushed = match due {
            Some(count) => Some(self.deliver(account, count).await?),
            None => None,
        };
        Ok(ClickReceipt {
            accepted: clicks,
            pending,
            flushed,
        })
    }

    /// Flush one account's buffer now.
    ///
    /// Returns `None` if nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns the sink's error.
    pub async fn flush(&self, account: AccountId) -> Result<Option<ClickCredit>, GameError> {
        let Some(entry) = self.pending.lock().await.remove(&account) else {
            return Ok(None);
        };
        self.deliver(account, entry.count).await.map(Some)
    }

    /// Flush every non-empty buffer.
    pub async fn flush_all(&self) -> FlushSummary {
        self.flush_where(|_| true).await
    }

    /// Flush buffers whose last flush is at least one window old.
    pub async fn flush_stale(&self) -> FlushSummary {
        let now = self.clock.now();
        let window = self.window;
        self.flush_where(move |entry| now.signed_duration_since(entry.window_start) >= window)
            .await
    }

    /// Drain every buffer before exit.
    pub async fn shutdown(&self) -> FlushSummary {
        let summary = self.flush_all().await;
        info!(
            accounts = summary.accounts,
            clicks = summary.clicks,
            failed = summary.failed,
            "Click buffer drained"
        );
        summary
    }

    /// Number of accounts with buffered clicks.
    pub async fn buffered_accounts(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Clicks currently buffered for `account`.
    pub async fn pending(&self, account: AccountId) -> u64 {
        self.pending
            .lock()
            .await
            .get(&account)
            .map_or(0, |entry| entry.count)
    }

    async fn flush_where(&self, due: impl Fn(&Pending) -> bool) -> FlushSummary {
        let batches: Vec<(AccountId, u64)> = {
            let mut buffers = self.pending.lock().await;
            let drained: Vec<(AccountId, u64)> = buffers
                .iter()
                .filter(|(_, entry)| due(entry))
                .map(|(account, entry)| (*account, entry.count))
                .collect();
            for (account, _) in &drained {
                buffers.remove(account);
            }
            drained
        };

        let mut summary = FlushSummary::default();
        for (account, count) in batches {
            match self.deliver(account, count).await {
                Ok(credit) => {
                    summary.accounts = summary.accounts.saturating_add(1);
                    summary.clicks = summary.clicks.saturating_add(credit.clicks);
                    summary.credited = summary.credited.saturating_add(credit.credited);
                }
                Err(_) => summary.failed = summary.failed.saturating_add(1),
            }
        }
        summary
    }

    /// Hand a batch to the sink. A transient failure puts the clicks back;
    /// any other failure drops them.
    async fn deliver(&self, account: AccountId, count: u64) -> Result<ClickCredit, GameError> {
        match self.sink.credit(account, count).await {
            Ok(credit) => Ok(credit),
            Err(err) => {
                if err.is_transient() {
                    let mut buffers = self.pending.lock().await;
                    let now = self.clock.now();
                    let entry = buffers.entry(account).or_insert(Pending {
                        count: 0,
                        window_start: now,
                    });
                    entry.count = entry.count.saturating_add(count);
                    warn!(account = %account, clicks = count, error = %err, "Click flush failed, batch kept");
                } else {
                    warn!(account = %account, clicks = count, error = %err, "Click flush rejected, batch dropped");
                }
                Err(err)
            }
        }
    }
}

/// Periodically flush stale buffers until shutdown is requested.
///
/// The final drain is left to the owner: it must call
/// [`ClickBuffer::shutdown`] once nothing can record clicks any more.
pub async fn run_sweep<S: ClickSink>(
    buffer: Arc<ClickBuffer<S>>,
    every: Duration,
    shutdown: Arc<ShutdownState>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        tokio::select! {
            () = shutdown.wait() => break,
            _ = ticker.tick() => {
                let summary = buffer.flush_stale().await;
                if summary.accounts > 0 || summary.failed > 0 {
                    info!(
                        accounts = summary.accounts,
                        clicks = summary.clicks,
                        failed = summary.failed,
                        "Stale click buffers flushed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use atomic_db::DbError;
    use rust_decimal::Decimal;

    use super::*;
    use crate::clock::ManualClock;

    /// Records every batch; optionally fails.
    #[derive(Default)]
    struct RecordingSink {
        batches: StdMutex<Vec<(AccountId, u64)>>,
        fail_transient: bool,
    }

    impl RecordingSink {
        fn batches(&self) -> Vec<(AccountId, u64)> {
            self.batches.lock().unwrap().clone()
        }
    }

    impl ClickSink for RecordingSink {
        async fn credit(&self, account: AccountId, clicks: u64) -> Result<ClickCredit, GameError> {
            if self.fail_transient {
                return Err(GameError::Store(DbError::Corrupt(String::from("offline"))));
            }
            self.batches.lock().unwrap().push((account, clicks));
            Ok(ClickCredit {
                clicks,
                power: Decimal::TEN,
                credited: clicks.saturating_mul(10),
            })
        }
    }

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn buffer(sink: RecordingSink) -> (ClickBuffer<RecordingSink>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let config = ClickBufferConfig::default();
        (ClickBuffer::new(sink, &config, clock.clone()), clock)
    }

    #[tokio::test]
    async fn clicks_below_both_triggers_stay_buffered() {
        let (buffer, _) = buffer(RecordingSink::default());
        let account = AccountId::new();

        for _ in 0..9 {
            let receipt = buffer.record(account, 1).await.unwrap();
            assert!(receipt.flushed.is_none());
        }
        assert_eq!(buffer.pending(account).await, 9);
        assert!(buffer.sink().batches().is_empty());
    }

    #[tokio::test]
    async fn burst_threshold_flushes_whole_batch() {
        let (buffer, _) = buffer(RecordingSink::default());
        let account = AccountId::new();

        for _ in 0..9 {
            buffer.record(account, 1).await.unwrap();
        }
        let receipt = buffer.record(account, 1).await.unwrap();
        let credit = receipt.flushed.unwrap();
        assert_eq!(credit.clicks, 10);
        assert_eq!(credit.credited, 100);
        assert_eq!(receipt.pending, 0);
        assert_eq!(buffer.sink().batches(), vec![(account, 10)]);
    }

    #[tokio::test]
    async fn window_elapsed_flushes_on_next_click() {
        let (buffer, clock) = buffer(RecordingSink::default());
        let account = AccountId::new();

        buffer.record(account, 3).await.unwrap();
        clock.advance(TimeDelta::milliseconds(5_000));
        let receipt = buffer.record(account, 1).await.unwrap();
        assert_eq!(receipt.flushed.map(|c| c.clicks), Some(4));
    }

    #[tokio::test]
    async fn second_flush_credits_nothing() {
        let (buffer, _) = buffer(RecordingSink::default());
        let account = AccountId::new();

        buffer.record(account, 4).await.unwrap();
        let first = buffer.flush(account).await.unwrap();
        assert_eq!(first.map(|c| c.clicks), Some(4));
        let second = buffer.flush(account).await.unwrap();
        assert!(second.is_none());
        assert_eq!(buffer.sink().batches().len(), 1);
    }

    #[tokio::test]
    async fn stale_sweep_skips_fresh_buffers() {
        let (buffer, clock) = buffer(RecordingSink::default());
        let old = AccountId::new();
        let fresh = AccountId::new();

        buffer.record(old, 2).await.unwrap();
        clock.advance(TimeDelta::seconds(6));
        buffer.record(fresh, 2).await.unwrap();

        let summary = buffer.flush_stale().await;
        assert_eq!(summary.accounts, 1);
        assert_eq!(summary.clicks, 2);
        assert_eq!(buffer.pending(old).await, 0);
        assert_eq!(buffer.pending(fresh).await, 2);
    }

    #[tokio::test]
    async fn shutdown_drains_everything() {
        let (buffer, _) = buffer(RecordingSink::default());
        let a = AccountId::new();
        let b = AccountId::new();
        buffer.record(a, 1).await.unwrap();
        buffer.record(b, 7).await.unwrap();

        let summary = buffer.shutdown().await;
        assert_eq!(summary.accounts, 2);
        assert_eq!(summary.clicks, 8);
        assert_eq!(summary.credited, 80);
        assert_eq!(buffer.pending(a).await, 0);
        assert_eq!(buffer.pending(b).await, 0);
    }

    #[tokio::test]
    async fn transient_failure_keeps_clicks() {
        let sink = RecordingSink {
            fail_transient: true,
            ..RecordingSink::default()
        };
        let (buffer, _) = buffer(sink);
        let account = AccountId::new();

        buffer.record(account, 5).await.unwrap();
        assert!(buffer.flush(account).await.is_err());
        assert_eq!(buffer.pending(account).await, 5);
    }

    #[tokio::test]
    async fn zero_clicks_rejected() {
        let (buffer, _) = buffer(RecordingSink::default());
        let err = buffer.record(AccountId::new(), 0).await.unwrap_err();
        assert!(matches!(err, GameError::NoClicks));
    }

    #[tokio::test]
    async fn oversized_batch_rejected_without_buffering() {
        let (buffer, _) = buffer(RecordingSink::default());
        let account = AccountId::new();

        let err = buffer.record(account, 1_000_000_000_000).await.unwrap_err();
        assert!(matches!(
            err,
            GameError::TooManyClicks {
                requested: 1_000_000_000_000,
                max: 10
            }
        ));
        assert_eq!(buffer.pending(account).await, 0);
        assert!(buffer.sink().batches().is_empty());

        let receipt = buffer.record(account, 10).await.unwrap();
        assert_eq!(receipt.flushed.map(|c| c.credited), Some(100));
    }

    #[tokio::test]
    async fn drained_accounts_leave_the_map() {
        let (buffer, clock) = buffer(RecordingSink::default());
        let burst = AccountId::new();
        let flushed = AccountId::new();
        let stale = AccountId::new();

        buffer.record(burst, 10).await.unwrap();
        buffer.record(flushed, 2).await.unwrap();
        buffer.record(stale, 2).await.unwrap();
        assert_eq!(buffer.buffered_accounts().await, 2);

        buffer.flush(flushed).await.unwrap();
        clock.advance(TimeDelta::seconds(6));
        buffer.flush_stale().await;
        assert_eq!(buffer.buffered_accounts().await, 0);
    }

    #[tokio::test]
    async fn transient_failure_restores_entry() {
        let sink = RecordingSink {
            fail_transient: true,
            ..RecordingSink::default()
        };
        let (buffer, _) = buffer(sink);
        let account = AccountId::new();

        buffer.record(account, 2).await.unwrap();
        let summary = buffer.flush_all().await;
        assert_eq!(summary.failed, 1);
        assert_eq!(buffer.buffered_accounts().await, 1);
        assert_eq!(buffer.pending(account).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_task_leaves_final_drain_to_owner() {
        let (buffer, _) = buffer(RecordingSink::default());
        let buffer = Arc::new(buffer);
        let shutdown = Arc::new(ShutdownState::new());
        let account = AccountId::new();
        buffer.record(account, 3).await.unwrap();

        let task = tokio::spawn(run_sweep(
            Arc::clone(&buffer),
            Duration::from_secs(10),
            Arc::clone(&shutdown),
        ));
        tokio::time::sleep(Duration::from_secs(25)).await;
        // The manual clock never moved, so the sweeps found nothing stale.
        assert_eq!(buffer.pending(account).await, 3);

        shutdown.request_stop();
        task.await.unwrap();

        // A request still in flight after the stop signal buffers more.
        buffer.record(account, 2).await.unwrap();
        assert_eq!(buffer.pending(account).await, 5);

        let summary = buffer.shutdown().await;
        assert_eq!(summary.clicks, 5);
        assert_eq!(buffer.pending(account).await, 0);
        assert_eq!(buffer.sink().batches(), vec![(account, 5)]);
    }
}
