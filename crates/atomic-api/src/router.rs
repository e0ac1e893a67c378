//! Axum router construction for the game API.
//!
//! Assembles every route into a single [`Router`] with permissive CORS
//! (the chat front-end runs on another origin) and HTTP tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router. See [`handlers`] for the endpoint table.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        // Accounts
        .route("/api/accounts", post(handlers::register_account))
        .route("/api/accounts/{external_id}", get(handlers::get_status))
        .route("/api/accounts/{external_id}/events", get(handlers::get_events))
        .route(
            "/api/accounts/{external_id}/achievements",
            get(handlers::get_achievements),
        )
        // Complexes
        .route(
            "/api/accounts/{external_id}/complexes",
            get(handlers::list_complexes),
        )
        .route(
            "/api/accounts/{external_id}/complexes/{kind}/purchase",
            post(handlers::purchase_complex),
        )
        .route(
            "/api/accounts/{external_id}/complexes/{kind}/upgrade",
            post(handlers::upgrade_complex),
        )
        // Boosters and bonuses
        .route(
            "/api/accounts/{external_id}/boosters",
            get(handlers::list_boosters),
        )
        .route(
            "/api/accounts/{external_id}/boosters/{kind}/activate",
            post(handlers::activate_booster),
        )
        .route(
            "/api/accounts/{external_id}/daily-bonus",
            post(handlers::claim_daily_bonus),
        )
        // Clicks
        .route(
            "/api/accounts/{external_id}/clicks",
            post(handlers::record_clicks),
        )
        // Rankings
        .route("/api/accounts/{external_id}/rank", get(handlers::get_rank))
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
