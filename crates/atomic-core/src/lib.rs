//! Game service, scheduler, click buffer and leaderboard for Atomic Progress.
//!
//! This crate turns the pure economy rules into a running game: it owns the
//! store transactions around every player action, the recurring jobs that
//! advance offline progress, and the process-local click batching.
//!
//! # Modules
//!
//! - [`config`] -- `atomic-config.yaml` loading into [`GameConfig`].
//! - [`service`] -- [`GameService`], every front-end and scheduler operation.
//! - [`scheduler`] -- [`Scheduler`] with the production, satellite, expiry,
//!   daily reset and leaderboard jobs.
//! - [`click_buffer`] -- [`ClickBuffer`], burst/window batching of manual clicks.
//! - [`leaderboard`] -- [`Leaderboard`] projection rebuild and rank queries.
//! - [`clock`] -- [`Clock`] abstraction with system and manual clocks.
//! - [`shutdown`] -- [`ShutdownState`], the shared stop signal.
//! - [`error`] -- [`GameError`] and its caller-facing classification.

pub mod click_buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod scheduler;
pub mod service;
pub mod shutdown;

pub use click_buffer::{ClickBuffer, ClickReceipt, ClickSink};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig, StoreBackend};
pub use error::{ErrorClass, GameError};
pub use leaderboard::Leaderboard;
pub use scheduler::{Job, PassSummary, Scheduler};
pub use service::{AccountStatus, BoosterBoard, GameService, Registered};
pub use shutdown::ShutdownState;
