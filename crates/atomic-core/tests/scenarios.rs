//! End-to-end game scenarios over the in-memory store.
//!
//! Every test drives the public [`GameService`] and [`Scheduler`] API with a
//! manual clock, so booster windows and satellite schedules are exact.

#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::sync::Arc;
use std::time::Duration;

use atomic_catalog::Catalog;
use atomic_core::click_buffer::{ClickBuffer, run_sweep};
use atomic_core::config::{ClickBufferConfig, SchedulerConfig};
use atomic_core::service::MAX_EVENTS;
use atomic_core::{
    ErrorClass, GameError, GameService, Job, ManualClock, Scheduler, ShutdownState,
};
use atomic_db::{AccountTx, GameStore, MemoryStore};
use atomic_economy::progression::recompute_total_production;
use atomic_economy::{EconomyError, EconomyRules};
use atomic_ledger::wallet;
use atomic_types::{
    AccountId, BoosterKind, ComplexKind, ComplexOwnership, EventKind, RankingMetric,
    ResourceBundle,
};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).unwrap()
}

fn game() -> (GameService, Arc<ManualClock>, Scheduler) {
    let clock = Arc::new(ManualClock::new(start()));
    let service = GameService::new(
        GameStore::Memory(MemoryStore::new()),
        Arc::new(Catalog::standard().unwrap()),
        EconomyRules::default(),
        clock.clone(),
    );
    let scheduler = Scheduler::new(
        service.clone(),
        SchedulerConfig::default(),
        Arc::new(ShutdownState::new()),
    );
    (service, clock, scheduler)
}

async fn register(service: &GameService, external_id: i64) -> AccountId {
    service
        .register_account(external_id, "comrade")
        .await
        .unwrap()
        .status
        .account_id
}

async fn grant(service: &GameService, id: AccountId, amount: ResourceBundle) {
    service
        .store()
        .update_account(id, |tx: &mut AccountTx| -> Result<(), GameError> {
            wallet::credit(&mut tx.record.account, &amount)?;
            Ok(())
        })
        .await
        .unwrap();
}

/// Put a complex at `level` directly, bypassing costs and prerequisites.
async fn install(service: &GameService, id: AccountId, kind: ComplexKind, level: u32) {
    let def = service.catalog().complex(kind).unwrap().clone();
    service
        .store()
        .update_account(id, move |tx: &mut AccountTx| -> Result<(), GameError> {
            let now = tx.record.account.updated_at;
            tx.record.complexes.insert(
                kind,
                ComplexOwnership {
                    kind,
                    level,
                    production: def.base_production * Decimal::from(level),
                    last_upgraded_at: now,
                },
            );
            recompute_total_production(&mut tx.record, now);
            Ok(())
        })
        .await
        .unwrap();
}

async fn energons(service: &GameService, external_id: i64) -> u64 {
    service
        .get_status(external_id)
        .await
        .unwrap()
        .balances
        .energons
}

// ---------------------------------------------------------------------------
// Registration and production
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_account_is_seeded() {
    let (service, _, _) = game();
    let registered = service.register_account(1, "  Yuri  ").await.unwrap();
    assert!(registered.created);

    let status = registered.status;
    assert_eq!(status.display_name, "Yuri");
    assert_eq!(status.balances, ResourceBundle::energons(100));
    assert_eq!(status.total_production, Decimal::ONE);
    assert_eq!(status.click_power, Decimal::TEN);
    assert_eq!(status.production_multiplier, Decimal::ONE);
    assert!(status.active_booster.is_none());

    let complexes = service.list_complexes(1).await.unwrap();
    let kollektiv = complexes
        .iter()
        .find(|q| q.kind == ComplexKind::Kollektiv1)
        .unwrap();
    assert_eq!(kollektiv.current_level, 1);
    assert_eq!(kollektiv.cost, ResourceBundle::energons(150));

    let events = service.get_events(1, 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::AccountCreated);
}

#[tokio::test]
async fn registering_twice_returns_existing_account() {
    let (service, _, _) = game();
    let first = register(&service, 2).await;
    service.purchase(2, ComplexKind::Kollektiv1).await.unwrap_err();

    let again = service.register_account(2, "Renamed").await.unwrap();
    assert!(!again.created);
    assert_eq!(again.status.account_id, first);
    assert_eq!(again.status.display_name, "Renamed");
    assert_eq!(again.status.balances, ResourceBundle::energons(100));
}

#[tokio::test]
async fn one_tick_credits_sixty_energons() {
    let (service, _, scheduler) = game();
    register(&service, 3).await;

    let summary = scheduler.run_pass(Job::Production).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.credited, ResourceBundle::energons(60));
    assert_eq!(energons(&service, 3).await, 160);

    let events = service.get_events(3, 1).await.unwrap();
    assert_eq!(events[0].kind, EventKind::Production);
    assert_eq!(events[0].amounts, ResourceBundle::energons(60));
}

#[tokio::test]
async fn amplified_tick_after_purchases() {
    let (service, _, scheduler) = game();
    let id = register(&service, 4).await;
    // 150 + 225 for KOLLEKTIV-1 L3, 500 + 800 for ZARYA-M L2.
    grant(&service, id, ResourceBundle::energons(1_575)).await;

    service.upgrade(4, ComplexKind::Kollektiv1).await.unwrap();
    service.upgrade(4, ComplexKind::Kollektiv1).await.unwrap();
    service.purchase(4, ComplexKind::ZaryaM).await.unwrap();
    let change = service.upgrade(4, ComplexKind::ZaryaM).await.unwrap();
    assert_eq!(change.level, 2);
    assert_eq!(change.total_production_rate, Decimal::from(3));
    assert_eq!(energons(&service, 4).await, 0);

    scheduler.run_pass(Job::Production).await.unwrap();
    assert_eq!(energons(&service, 4).await, 198);
}

#[tokio::test]
async fn one_failing_account_does_not_stop_the_pass() {
    let (service, _, scheduler) = game();
    register(&service, 50).await;
    let full = register(&service, 51).await;
    // 50 short of the ceiling, so the next 60-energon credit overflows.
    grant(&service, full, ResourceBundle::energons(u64::MAX - 150)).await;

    let summary = scheduler.run_pass(Job::Production).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.credited, ResourceBundle::energons(60));

    assert_eq!(energons(&service, 50).await, 160);
    assert_eq!(energons(&service, 51).await, u64::MAX - 50);
    let newest = service.get_events(51, 1).await.unwrap();
    assert_ne!(newest[0].kind, EventKind::Production);
}

#[tokio::test]
async fn event_history_is_bounded() {
    let (service, _, _) = game();
    let id = register(&service, 52).await;

    for _ in 0..1_440 {
        service.accrue_production(id, 60).await.unwrap();
    }

    assert_eq!(energons(&service, 52).await, 100 + 1_440 * 60);
    let events = service.get_events(52, MAX_EVENTS).await.unwrap();
    assert_eq!(events.len(), 200);
    let GameStore::Memory(memory) = service.store() else {
        panic!("scenarios run on the memory store");
    };
    assert_eq!(memory.retained_events(id).await, 200);
}

#[tokio::test]
async fn failed_purchase_changes_nothing() {
    let (service, _, _) = game();
    let id = register(&service, 5).await;
    grant(&service, id, ResourceBundle::energons(300)).await;
    service.upgrade(5, ComplexKind::Kollektiv1).await.unwrap();
    service.upgrade(5, ComplexKind::Kollektiv1).await.unwrap();
    let before = service.get_status(5).await.unwrap();
    let events_before = service.get_events(5, 50).await.unwrap().len();

    let err = service.purchase(5, ComplexKind::ZaryaM).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Declined);
    assert!(matches!(
        err,
        GameError::Economy(EconomyError::InsufficientResources { required: 500, .. })
    ));

    assert_eq!(service.get_status(5).await.unwrap(), before);
    assert_eq!(service.get_events(5, 50).await.unwrap().len(), events_before);
}

#[tokio::test]
async fn locked_complex_is_declined() {
    let (service, _, _) = game();
    let id = register(&service, 6).await;
    grant(&service, id, ResourceBundle::energons(100_000)).await;

    let err = service.purchase(6, ComplexKind::SoyuzAtom).await.unwrap_err();
    assert!(matches!(
        err,
        GameError::Economy(EconomyError::LockedPrerequisite {
            requires: ComplexKind::Kollektiv1,
            level: 5,
            current: 1,
        })
    ));
    assert_eq!(energons(&service, 6).await, 100_100);
}

// ---------------------------------------------------------------------------
// Boosters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn booster_triples_production_until_it_expires() {
    let (service, clock, scheduler) = game();
    let id = register(&service, 7).await;
    install(&service, id, ComplexKind::Kollektiv1, 3).await;
    install(&service, id, ComplexKind::ZaryaM, 2).await;
    grant(&service, id, ResourceBundle::energons(4_900)).await;

    let activation = service
        .activate_booster(7, BoosterKind::ProtonM87)
        .await
        .unwrap();
    assert_eq!(activation.cost, ResourceBundle::energons(5_000));
    assert_eq!(energons(&service, 7).await, 0);

    let err = service
        .activate_booster(7, BoosterKind::ProtonM87)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::Economy(EconomyError::AlreadyActive { .. })
    ));

    scheduler.run_pass(Job::Production).await.unwrap();
    assert_eq!(energons(&service, 7).await, 594);

    clock.advance(TimeDelta::hours(4));
    let swept = scheduler.run_pass(Job::BoosterExpiry).await.unwrap();
    assert_eq!(swept.processed, 1);

    let status = service.get_status(7).await.unwrap();
    assert!(status.active_booster.is_none());
    assert_eq!(status.production_multiplier, Decimal::ONE);
    assert_eq!(status.click_multiplier, Decimal::ONE);

    scheduler.run_pass(Job::Production).await.unwrap();
    assert_eq!(energons(&service, 7).await, 792);

    let kinds: Vec<EventKind> = service
        .get_events(7, 50)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert!(kinds.contains(&EventKind::BoosterActivated));
    assert!(kinds.contains(&EventKind::BoosterExpired));
}

#[tokio::test]
async fn lapsed_booster_expires_on_read() {
    let (service, clock, _) = game();
    let id = register(&service, 8).await;
    install(&service, id, ComplexKind::ZaryaM, 2).await;
    grant(&service, id, ResourceBundle::energons(5_000)).await;
    service
        .activate_booster(8, BoosterKind::ProtonM87)
        .await
        .unwrap();

    clock.advance(TimeDelta::hours(5));
    let board = service.list_boosters(8).await.unwrap();
    assert!(board.active.is_none());
    assert_eq!(board.offers.len(), 5);

    let events = service.get_events(8, 1).await.unwrap();
    assert_eq!(events[0].kind, EventKind::BoosterExpired);
}

#[tokio::test]
async fn instant_booster_grants_a_day_of_production() {
    let (service, _, _) = game();
    let id = register(&service, 9).await;
    install(&service, id, ComplexKind::Kollektiv1, 5).await;
    install(&service, id, ComplexKind::SoyuzAtom, 5).await;
    grant(&service, id, ResourceBundle::new(9_900, 500, 0)).await;

    let activation = service
        .activate_booster(9, BoosterKind::RedStar)
        .await
        .unwrap();
    assert!(activation.ends_at.is_none());
    // 5/s energons and 1/s neutrons for 86,400 s.
    assert_eq!(activation.granted, ResourceBundle::new(432_000, 86_400, 0));

    let status = service.get_status(9).await.unwrap();
    assert!(status.active_booster.is_none());
    assert_eq!(status.balances, ResourceBundle::new(432_000, 86_400, 0));
}

// ---------------------------------------------------------------------------
// Clicks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn buffered_clicks_are_credited_in_one_batch() {
    let (service, clock, _) = game();
    register(&service, 10).await;
    let buffer = ClickBuffer::new(service.clone(), &ClickBufferConfig::default(), clock.clone());

    for _ in 0..9 {
        let receipt = service.record_manual_click(&buffer, 10, 1).await.unwrap();
        assert!(receipt.flushed.is_none());
    }
    assert_eq!(energons(&service, 10).await, 100);

    let receipt = service.record_manual_click(&buffer, 10, 1).await.unwrap();
    let credit = receipt.flushed.unwrap();
    assert_eq!(credit.credited, 100);
    assert_eq!(energons(&service, 10).await, 200);
    assert_eq!(service.get_status(10).await.unwrap().manual_clicks, 10);

    service.record_manual_click(&buffer, 10, 3).await.unwrap();
    let summary = buffer.shutdown().await;
    assert_eq!(summary.clicks, 3);
    assert_eq!(energons(&service, 10).await, 230);
}

#[tokio::test]
async fn oversized_click_request_credits_nothing() {
    let (service, clock, _) = game();
    register(&service, 15).await;
    let buffer = ClickBuffer::new(service.clone(), &ClickBufferConfig::default(), clock.clone());

    let err = service
        .record_manual_click(&buffer, 15, 1_000_000_000_000)
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Invalid);
    assert!(matches!(
        err,
        GameError::TooManyClicks {
            requested: 1_000_000_000_000,
            max: 10
        }
    ));
    assert_eq!(energons(&service, 15).await, 100);
    assert_eq!(buffer.shutdown().await.clicks, 0);
    assert_eq!(service.get_events(15, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn clicks_after_the_stop_signal_reach_the_final_drain() {
    let (service, clock, _) = game();
    register(&service, 16).await;
    let buffer = Arc::new(ClickBuffer::new(
        service.clone(),
        &ClickBufferConfig::default(),
        clock.clone(),
    ));
    let shutdown = Arc::new(ShutdownState::new());
    let sweep = tokio::spawn(run_sweep(
        Arc::clone(&buffer),
        Duration::from_secs(10),
        Arc::clone(&shutdown),
    ));

    shutdown.request_stop();
    sweep.await.unwrap();

    let receipt = service.record_manual_click(&buffer, 16, 3).await.unwrap();
    assert_eq!(receipt.pending, 3);
    assert_eq!(energons(&service, 16).await, 100);

    let summary = buffer.shutdown().await;
    assert_eq!(summary.clicks, 3);
    assert_eq!(energons(&service, 16).await, 130);
}

#[tokio::test]
async fn click_power_floors_per_batch() {
    let (service, _, _) = game();
    let id = register(&service, 11).await;
    install(&service, id, ComplexKind::KrasniyCiklotron, 3).await;

    // 10 · 1.3 = 13 per click.
    let credit = service.credit_clicks(id, 7).await.unwrap();
    assert_eq!(credit.credited, 91);
    assert!(matches!(
        service.credit_clicks(id, 0).await.unwrap_err(),
        GameError::NoClicks
    ));
}

// ---------------------------------------------------------------------------
// Bonuses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn daily_bonus_streak_across_resets() {
    let (service, _, scheduler) = game();
    register(&service, 12).await;

    let first = service.claim_daily_bonus(12).await.unwrap();
    assert_eq!((first.streak, first.amount), (1, 100));

    let err = service.claim_daily_bonus(12).await.unwrap_err();
    assert!(matches!(
        err,
        GameError::Economy(EconomyError::AlreadyClaimed { streak: 1 })
    ));

    let reset = scheduler.run_pass(Job::DailyReset).await.unwrap();
    assert_eq!(reset.processed, 1);

    let second = service.claim_daily_bonus(12).await.unwrap();
    assert_eq!((second.streak, second.amount), (2, 150));
    assert_eq!(energons(&service, 12).await, 350);
}

#[tokio::test]
async fn satellite_pays_once_per_period() {
    let (service, clock, scheduler) = game();
    let id = register(&service, 13).await;
    install(&service, id, ComplexKind::Kollektiv1, 10).await;
    install(&service, id, ComplexKind::SputnikGamma, 1).await;

    let paid = scheduler.run_pass(Job::Satellite).await.unwrap();
    assert_eq!(paid.credited, ResourceBundle::energons(21_600));

    let again = scheduler.run_pass(Job::Satellite).await.unwrap();
    assert_eq!(again.processed, 0);

    clock.advance(TimeDelta::seconds(1_800));
    let later = scheduler.run_pass(Job::Satellite).await.unwrap();
    assert_eq!(later.processed, 1);
    assert_eq!(energons(&service, 13).await, 100 + 2 * 21_600);
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn banned_account_is_frozen() {
    let (service, _, scheduler) = game();
    register(&service, 14).await;
    assert!(service.set_banned(14, true).await.unwrap());
    assert!(!service.set_banned(14, true).await.unwrap());

    let err = service.claim_daily_bonus(14).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);

    let summary = scheduler.run_pass(Job::Production).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(energons(&service, 14).await, 100);

    service.set_banned(14, false).await.unwrap();
    service.claim_daily_bonus(14).await.unwrap();
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let (service, _, _) = game();
    let err = service.get_status(404).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn richest_account_ranks_first() {
    let (service, _, scheduler) = game();
    for (external_id, extra) in [(20, 500), (21, 5_000), (22, 50)] {
        let id = register(&service, external_id).await;
        grant(&service, id, ResourceBundle::energons(extra)).await;
    }
    let rebuilt = scheduler.run_pass(Job::Leaderboard).await.unwrap();
    assert_eq!(rebuilt.processed, 3);

    let top = service
        .get_leaderboard(RankingMetric::Energons, 10)
        .await
        .unwrap();
    let order: Vec<u64> = top.iter().map(|e| e.energons).collect();
    assert_eq!(order, vec![5_100, 600, 150]);

    let rank = service.get_rank(21, RankingMetric::Energons).await.unwrap();
    assert_eq!(rank.position, 1);
    let rank = service.get_rank(22, RankingMetric::Energons).await.unwrap();
    assert_eq!(rank.position, 3);
}

#[tokio::test]
async fn tied_accounts_share_a_position() {
    let (service, _, scheduler) = game();
    register(&service, 30).await;
    register(&service, 31).await;
    scheduler.run_pass(Job::Leaderboard).await.unwrap();

    let a = service.get_rank(30, RankingMetric::TotalLevel).await.unwrap();
    let b = service.get_rank(31, RankingMetric::TotalLevel).await.unwrap();
    assert_eq!(a.position, 1);
    assert_eq!(b.position, 1);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clicks_and_ticks_lose_nothing() {
    let (service, _, scheduler) = game();
    let id = register(&service, 40).await;
    let scheduler = Arc::new(scheduler);

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service.credit_clicks(id, 1).await.map(|_| ())
        }));
    }
    for _ in 0..5 {
        let scheduler = Arc::clone(&scheduler);
        tasks.push(tokio::spawn(async move {
            scheduler.run_pass(Job::Production).await.map(|_| ())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // 100 seed + 20 clicks at 10 + 5 ticks at 60.
    assert_eq!(energons(&service, 40).await, 100 + 200 + 300);
}
