//! Game server binary for Atomic Progress.
//!
//! Wires the account store, the game service, the recurring jobs, the
//! click buffer sweep and the HTTP API together, then runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `atomic-config.yaml`
//! 3. Build and validate the catalog
//! 4. Open the account store (memory or `PostgreSQL` + migrations)
//! 5. Attach the optional Dragonfly rank index
//! 6. Spawn the scheduler jobs and the click buffer sweep
//! 7. Serve the HTTP API until shutdown
//! 8. Wait for the jobs, drain the click buffer, close the pool

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use atomic_api::AppState;
use atomic_catalog::Catalog;
use atomic_core::click_buffer::run_sweep;
use atomic_core::config::StoreConfig;
use atomic_core::{
    ClickBuffer, Clock, GameConfig, GameService, Scheduler, ShutdownState, StoreBackend,
    SystemClock,
};
use atomic_db::{DragonflyPool, GameStore, MemoryStore, PgGameStore, PostgresConfig, PostgresPool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "atomic-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the HTTP server
/// cannot bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("atomic-server starting");

    let GameConfig {
        server,
        store,
        scheduler,
        click_buffer,
        economy,
    } = GameConfig::load_or_default(Path::new(CONFIG_PATH)).map_err(StartupError::from)?;
    info!(
        backend = ?store.backend,
        port = server.port,
        production_secs = scheduler.production_secs,
        "Configuration loaded"
    );

    let catalog = Catalog::standard().map_err(StartupError::from)?;
    info!(
        complexes = catalog.complexes().count(),
        boosters = catalog.boosters().count(),
        "Catalog loaded"
    );

    let game_store = open_store(&store).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut service = GameService::new(game_store, Arc::new(catalog), economy, Arc::clone(&clock));

    if let Some(url) = &store.dragonfly_url {
        match DragonflyPool::connect(url).await {
            Ok(ranks) => {
                service = service.with_rank_index(ranks);
                info!("Dragonfly rank index attached");
            }
            Err(e) => {
                warn!(error = %e, "Dragonfly unavailable, ranking from the store only");
            }
        }
    }

    let shutdown = Arc::new(ShutdownState::new());

    let clicks = Arc::new(ClickBuffer::new(service.clone(), &click_buffer, clock));
    let sweep = tokio::spawn(run_sweep(
        Arc::clone(&clicks),
        Duration::from_secs(click_buffer.sweep_secs),
        Arc::clone(&shutdown),
    ));

    let jobs = Arc::new(Scheduler::new(
        service.clone(),
        scheduler,
        Arc::clone(&shutdown),
    ))
    .spawn();

    let stop = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Ctrl-C received, shutting down");
        stop.request_stop();
    });

    let app_state = Arc::new(AppState::new(service.clone(), Arc::clone(&clicks)));
    let served = atomic_api::start_server(&server, app_state, Arc::clone(&shutdown)).await;

    // The API may have failed on its own; make sure everything else stops.
    shutdown.request_stop();
    for job in jobs {
        if let Err(e) = job.await {
            warn!(error = %e, "Scheduler job aborted");
        }
    }
    if let Err(e) = sweep.await {
        warn!(error = %e, "Click sweep aborted");
    }
    // The server has drained its requests, so no click can arrive after this.
    clicks.shutdown().await;
    if let GameStore::Postgres(pg) = service.store() {
        pg.pool().close().await;
    }

    served.map_err(StartupError::from)?;
    info!("atomic-server shutdown complete");
    Ok(())
}

/// Human-readable logs by default; `ATOMIC_LOG_FORMAT=json` switches to
/// one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("ATOMIC_LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Open the configured account store, running migrations for `PostgreSQL`.
async fn open_store(config: &StoreConfig) -> Result<GameStore, StartupError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory account store");
            Ok(GameStore::Memory(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let mut pg_config = PostgresConfig::new(&config.postgres_url);
            pg_config.max_connections = config.max_connections;
            let pool = PostgresPool::connect(&pg_config).await?;
            pool.run_migrations().await?;
            info!(max_connections = config.max_connections, "PostgreSQL account store ready");
            Ok(GameStore::Postgres(PgGameStore::new(pool)))
        }
    }
}
