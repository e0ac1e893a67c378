//! Recurring economy jobs.
//!
//! Five jobs advance the economy independently of player actions:
//!
//! | Job | Default period | Effect |
//! |-----|----------------|--------|
//! | [`Job::Production`] | 60 s | passive production + labor automation for producing accounts |
//! | [`Job::Satellite`] | 30 min | satellite bonus for due owners |
//! | [`Job::BoosterExpiry`] | 5 min | resets lapsed boosters |
//! | [`Job::DailyReset`] | daily at a UTC hour | clears daily bonus flags |
//! | [`Job::Leaderboard`] | 1 h | rebuilds the ranking projection |
//!
//! Each pass runs per-account work concurrently and treats every account as
//! its own failure domain: a failed account is logged and skipped, and is
//! picked up again on the next tick. Each tick dispatches its pass as a
//! separate task, so a slow pass never delays the ticker; a tick that
//! arrives while the previous pass is still running is skipped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use atomic_economy::EconomyError;
use atomic_types::{AccountId, ResourceBundle};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::GameError;
use crate::service::GameService;
use crate::shutdown::ShutdownState;

/// The recurring jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    /// Passive production tick.
    Production,
    /// Satellite bonus pass.
    Satellite,
    /// Booster expiry sweep.
    BoosterExpiry,
    /// Daily bonus flag reset.
    DailyReset,
    /// Leaderboard rebuild.
    Leaderboard,
}

impl Job {
    /// Every job.
    pub const ALL: [Self; 5] = [
        Self::Production,
        Self::Satellite,
        Self::BoosterExpiry,
        Self::DailyReset,
        Self::Leaderboard,
    ];

    /// Stable name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Satellite => "satellite",
            Self::BoosterExpiry => "booster_expiry",
            Self::DailyReset => "daily_reset",
            Self::Leaderboard => "leaderboard",
        }
    }
}

/// Totals for one job pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// The job that ran.
    pub job: Job,
    /// Accounts (or rows) the pass changed.
    pub processed: u64,
    /// Accounts that were eligible but had nothing to do or were banned.
    pub skipped: u64,
    /// Accounts whose update failed.
    pub failed: u64,
    /// Resources credited by the pass.
    pub credited: ResourceBundle,
}

impl PassSummary {
    const fn empty(job: Job) -> Self {
        Self {
            job,
            processed: 0,
            skipped: 0,
            failed: 0,
            credited: ResourceBundle::ZERO,
        }
    }
}

/// Outcome of one account's share of a pass.
enum Step {
    Done(ResourceBundle),
    Skipped,
    Failed,
}

/// Runs the recurring jobs against a [`GameService`].
pub struct Scheduler {
    service: GameService,
    config: SchedulerConfig,
    shutdown: Arc<ShutdownState>,
}

impl Scheduler {
    /// Create a scheduler. Nothing runs until [`spawn`](Self::spawn).
    pub const fn new(
        service: GameService,
        config: SchedulerConfig,
        shutdown: Arc<ShutdownState>,
    ) -> Self {
        Self {
            service,
            config,
            shutdown,
        }
    }

    /// Start one task per job. Each returns after shutdown is requested
    /// and its in-flight pass has finished.
    pub fn spawn(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        info!(
            production_secs = self.config.production_secs,
            satellite_secs = self.config.satellite_secs,
            expiry_secs = self.config.expiry_secs,
            leaderboard_secs = self.config.leaderboard_secs,
            daily_reset_hour_utc = self.config.daily_reset_hour_utc,
            "Scheduler starting"
        );
        Job::ALL
            .into_iter()
            .map(|job| {
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    match job {
                        Job::DailyReset => scheduler.run_daily(job).await,
                        _ => scheduler.run_interval(job).await,
                    }
                })
            })
            .collect()
    }

    /// Run one pass of `job` immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Store`] if the job's account listing fails.
    /// Per-account failures are counted, not returned.
    pub async fn run_pass(&self, job: Job) -> Result<PassSummary, GameError> {
        match job {
            Job::Production => self.production_pass().await,
            Job::Satellite => self.satellite_pass().await,
            Job::BoosterExpiry => self.expiry_pass().await,
            Job::DailyReset => self.daily_reset_pass().await,
            Job::Leaderboard => self.leaderboard_pass().await,
        }
    }

    // -----------------------------------------------------------------------
    // Passes
    // -----------------------------------------------------------------------

    /// Credit one production window to every producing account.
    pub async fn production_pass(&self) -> Result<PassSummary, GameError> {
        let secs = self.config.production_secs;
        let ids = self.service.store().producing_accounts().await?;
        let summary = self
            .for_each_account(Job::Production, ids, |service, id| async move {
                match service.accrue_production(id, secs).await {
                    Ok(accrual) if accrual.total.is_empty() => Step::Skipped,
                    Ok(accrual) => Step::Done(accrual.total),
                    Err(err) => skip_or_fail(Job::Production, id, &err),
                }
            })
            .await;
        Ok(summary)
    }

    /// Pay the satellite bonus to every due owner.
    pub async fn satellite_pass(&self) -> Result<PassSummary, GameError> {
        let Some(satellite) = self.service.satellite_kind() else {
            return Ok(PassSummary::empty(Job::Satellite));
        };
        let ids = self
            .service
            .store()
            .satellite_due(satellite, self.service.now())
            .await?;
        let summary = self
            .for_each_account(Job::Satellite, ids, |service, id| async move {
                match service.pay_satellite(id).await {
                    Ok(Some(payout)) if payout.amount > 0 => {
                        Step::Done(ResourceBundle::energons(payout.amount))
                    }
                    Ok(_) => Step::Skipped,
                    Err(err) => skip_or_fail(Job::Satellite, id, &err),
                }
            })
            .await;
        Ok(summary)
    }

    /// Reset every lapsed booster.
    pub async fn expiry_pass(&self) -> Result<PassSummary, GameError> {
        let ids = self
            .service
            .store()
            .expired_boosters(self.service.now())
            .await?;
        let summary = self
            .for_each_account(Job::BoosterExpiry, ids, |service, id| async move {
                match service.expire_booster(id).await {
                    Ok(Some(_)) => Step::Done(ResourceBundle::ZERO),
                    Ok(None) => Step::Skipped,
                    Err(err) => skip_or_fail(Job::BoosterExpiry, id, &err),
                }
            })
            .await;
        Ok(summary)
    }

    /// Clear every daily bonus flag.
    pub async fn daily_reset_pass(&self) -> Result<PassSummary, GameError> {
        let reset = self.service.store().reset_daily_flags().await?;
        let summary = PassSummary {
            processed: reset,
            ..PassSummary::empty(Job::DailyReset)
        };
        log_summary(&summary);
        Ok(summary)
    }

    /// Rebuild the leaderboard projection.
    pub async fn leaderboard_pass(&self) -> Result<PassSummary, GameError> {
        let rebuilt = self
            .service
            .leaderboard()
            .rebuild(self.service.now())
            .await?;
        Ok(PassSummary {
            processed: rebuilt.entries,
            failed: rebuilt.drifted,
            ..PassSummary::empty(Job::Leaderboard)
        })
    }

    async fn for_each_account<F, Fut>(&self, job: Job, ids: Vec<AccountId>, step: F) -> PassSummary
    where
        F: Fn(GameService, AccountId) -> Fut,
        Fut: Future<Output = Step>,
    {
        let concurrency = self.config.concurrency.max(1);
        let summary = stream::iter(ids)
            .map(|id| step(self.service.clone(), id))
            .buffer_unordered(concurrency)
            .fold(PassSummary::empty(job), |mut summary, outcome| async move {
                match outcome {
                    Step::Done(credited) => {
                        summary.processed = summary.processed.saturating_add(1);
                        summary.credited = saturating_sum(&summary.credited, &credited);
                    }
                    Step::Skipped => summary.skipped = summary.skipped.saturating_add(1),
                    Step::Failed => summary.failed = summary.failed.saturating_add(1),
                }
                summary
            })
            .await;
        log_summary(&summary);
        summary
    }

    // -----------------------------------------------------------------------
    // Loops
    // -----------------------------------------------------------------------

    fn period(&self, job: Job) -> Duration {
        let secs = match job {
            Job::Production => self.config.production_secs,
            Job::Satellite => self.config.satellite_secs,
            Job::BoosterExpiry => self.config.expiry_secs,
            Job::Leaderboard => self.config.leaderboard_secs,
            Job::DailyReset => 86_400,
        };
        Duration::from_secs(secs.max(1))
    }

    async fn run_interval(self: Arc<Self>, job: Job) {
        let mut ticker = tokio::time::interval(self.period(job));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; the first pass waits a full period.
        ticker.tick().await;

        let mut in_flight: Option<JoinHandle<()>> = None;
        loop {
            tokio::select! {
                () = self.shutdown.wait() => break,
                _ = ticker.tick() => {}
            }
            if in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
                warn!(job = job.as_str(), "Previous pass still running, tick skipped");
                continue;
            }
            in_flight = Some(self.dispatch(job));
        }

        finish(job, in_flight).await;
    }

    async fn run_daily(self: Arc<Self>, job: Job) {
        let mut in_flight: Option<JoinHandle<()>> = None;
        loop {
            let now = self.service.now();
            let next = next_daily_reset(now, self.config.daily_reset_hour_utc);
            let wait = next
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO);
            debug!(job = job.as_str(), next = %next, "Next daily reset scheduled");

            tokio::select! {
                () = self.shutdown.wait() => break,
                () = tokio::time::sleep(wait) => {}
            }
            if in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
                warn!(job = job.as_str(), "Previous pass still running, tick skipped");
                continue;
            }
            in_flight = Some(self.dispatch(job));
        }

        finish(job, in_flight).await;
    }

    /// Run a pass in its own task, watched by a soft timeout.
    fn dispatch(self: &Arc<Self>, job: Job) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let pass = scheduler.run_pass(job);
            let outcome = match scheduler.config.job_timeout() {
                Some(limit) => {
                    tokio::pin!(pass);
                    match tokio::time::timeout(limit, &mut pass).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(
                                job = job.as_str(),
                                timeout_secs = limit.as_secs(),
                                "Pass exceeded soft timeout, letting it finish"
                            );
                            pass.await
                        }
                    }
                }
                None => pass.await,
            };
            if let Err(err) = outcome {
                warn!(job = job.as_str(), error = %err, "Pass failed, retrying next tick");
            }
        })
    }
}

/// Wait for an in-flight pass during shutdown.
async fn finish(job: Job, in_flight: Option<JoinHandle<()>>) {
    if let Some(task) = in_flight
        && let Err(err) = task.await
    {
        warn!(job = job.as_str(), error = %err, "Pass task aborted");
    }
    info!(job = job.as_str(), "Job stopped");
}

/// The next time at `hour:00` UTC strictly after `now`.
pub fn next_daily_reset(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today
            .checked_add_signed(TimeDelta::days(1))
            .unwrap_or(today)
    }
}

/// Banned accounts are skipped quietly; anything else is a logged failure.
fn skip_or_fail(job: Job, id: AccountId, err: &GameError) -> Step {
    if matches!(err, GameError::Economy(EconomyError::Banned)) {
        return Step::Skipped;
    }
    warn!(job = job.as_str(), account = %id, error = %err, "Account skipped");
    Step::Failed
}

fn saturating_sum(a: &ResourceBundle, b: &ResourceBundle) -> ResourceBundle {
    ResourceBundle::new(
        a.energons.saturating_add(b.energons),
        a.neutrons.saturating_add(b.neutrons),
        a.particles.saturating_add(b.particles),
    )
}

fn log_summary(summary: &PassSummary) {
    info!(
        job = summary.job.as_str(),
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        energons = summary.credited.energons,
        neutrons = summary.credited.neutrons,
        particles = summary.credited.particles,
        "Pass complete"
    );
}
