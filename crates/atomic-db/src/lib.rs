//! Data layer for the Atomic Progress game economy.
//!
//! The engine talks to one [`GameStore`], which is either process-local
//! memory or `PostgreSQL`. `Dragonfly` optionally mirrors the leaderboard
//! projection as sorted sets for fast rank lookups.
//!
//! # Architecture
//!
//! ```text
//! GameService / Scheduler
//!     |
//!     +-- update_account(id, |tx| ...) --> GameStore
//!     |                                     |-- Memory   (per-account mutex)
//!     |                                     +-- Postgres (SELECT ... FOR UPDATE)
//!     |
//!     +-- leaderboard rebuild ----------> GameStore projection
//!                                        + DragonflyPool rank sets (optional)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`GameStore`] seam and [`AccountTx`]
//! - [`memory`] -- In-memory backend
//! - [`pg_store`] -- `PostgreSQL` backend
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`dragonfly`] -- `Dragonfly` rank index
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod pg_store;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyPool;
pub use error::DbError;
pub use memory::MemoryStore;
pub use pg_store::PgGameStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use store::{AccountTx, GameStore, MAX_EVENT_PAGE, Registration};
