//! HTTP API for the Atomic Progress game service.
//!
//! The chat front-end talks to the game exclusively through these JSON
//! endpoints. Handlers hold no game logic; each one parses its inputs and
//! calls one [`atomic_core::GameService`] operation. Declined actions come
//! back as `4xx` responses with a readable reason, store failures as a
//! generic `500`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
