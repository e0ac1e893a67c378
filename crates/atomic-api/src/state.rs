//! Shared application state for the game API.
//!
//! [`AppState`] is wrapped in [`Arc`] and injected into every handler via
//! Axum's `State` extractor. It holds the game service and the process-wide
//! click buffer the background sweep also drains.

use std::sync::Arc;

use atomic_core::{ClickBuffer, GameService};

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// The game engine.
    pub service: GameService,
    /// Manual clicks waiting to be credited.
    pub clicks: Arc<ClickBuffer<GameService>>,
}

impl AppState {
    /// Bundle the service with the click buffer it credits through.
    pub const fn new(service: GameService, clicks: Arc<ClickBuffer<GameService>>) -> Self {
        Self { service, clicks }
    }
}
