//! REST endpoint handlers for the game API.
//!
//! Every handler is a thin shell over one [`GameService`] operation:
//! parse the path and query, call the service, serialize the result.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/health` | Liveness |
//! | `POST` | `/api/accounts` | Register (get-or-create) an account |
//! | `GET` | `/api/accounts/{external_id}` | Account status |
//! | `GET` | `/api/accounts/{external_id}/complexes` | Complex quotes |
//! | `POST` | `/api/accounts/{external_id}/complexes/{kind}/purchase` | Buy a complex |
//! | `POST` | `/api/accounts/{external_id}/complexes/{kind}/upgrade` | Upgrade a complex |
//! | `GET` | `/api/accounts/{external_id}/boosters` | Booster board |
//! | `POST` | `/api/accounts/{external_id}/boosters/{kind}/activate` | Activate a booster |
//! | `POST` | `/api/accounts/{external_id}/daily-bonus` | Claim the daily bonus |
//! | `POST` | `/api/accounts/{external_id}/clicks` | Record manual clicks |
//! | `GET` | `/api/accounts/{external_id}/events` | Recent events |
//! | `GET` | `/api/accounts/{external_id}/achievements` | Achievement progress |
//! | `GET` | `/api/accounts/{external_id}/rank` | Rank on one metric |
//! | `GET` | `/api/leaderboard` | Top of the leaderboard |
//!
//! [`GameService`]: atomic_core::GameService

use std::str::FromStr;
use std::sync::Arc;

use atomic_types::{BoosterKind, ComplexKind, RankingMetric};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// Default page size for `GET /api/accounts/{external_id}/events`.
const DEFAULT_EVENT_LIMIT: u32 = 50;

/// Default page size for `GET /api/leaderboard`.
const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

// ---------------------------------------------------------------------------
// Request bodies and query parameters
// ---------------------------------------------------------------------------

/// Request body for `POST /api/accounts`.
#[derive(Debug, serde::Deserialize)]
pub struct RegisterRequest {
    /// Chat identity of the player.
    pub external_id: i64,
    /// Leaderboard name (defaults to `comrade-{external_id}`).
    #[serde(default)]
    pub display_name: String,
}

/// Request body for `POST /api/accounts/{external_id}/clicks`.
#[derive(Debug, serde::Deserialize)]
pub struct ClickRequest {
    /// Clicks to record (default 1, at most the burst threshold).
    #[serde(default = "default_clicks")]
    pub clicks: u64,
}

const fn default_clicks() -> u64 {
    1
}

/// Query parameters for `GET /api/accounts/{external_id}/events`.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Maximum number of events to return.
    pub limit: Option<u32>,
}

/// Query parameters for the ranking endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct RankingQuery {
    /// `energons` (default), `neutrons`, `particles`, `production` or
    /// `total_level`.
    pub metric: Option<String>,
    /// Maximum number of rows (leaderboard only).
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Liveness probe, with the service clock's current time.
#[allow(clippy::unused_async)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "now": state.service.now() }))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Get-or-create the account for a chat identity. Responds `201` when the
/// account was created and `200` when it already existed.
pub async fn register_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registered = state
        .service
        .register_account(request.external_id, &request.display_name)
        .await?;
    let status = if registered.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(registered)))
}

/// Current account status.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    Ok(Json(state.service.get_status(external_id).await?))
}

/// Recent events, newest first.
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    let limit = params.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    Ok(Json(state.service.get_events(external_id, limit).await?))
}

/// Achievement progress.
pub async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    Ok(Json(state.service.get_achievements(external_id).await?))
}

// ---------------------------------------------------------------------------
// Complexes
// ---------------------------------------------------------------------------

/// Next-level quote for every complex.
pub async fn list_complexes(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    Ok(Json(state.service.list_complexes(external_id).await?))
}

/// Buy the first level of a complex.
pub async fn purchase_complex(
    State(state): State<Arc<AppState>>,
    Path((external_id, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    let kind = parse::<ComplexKind>(&kind)?;
    Ok(Json(state.service.purchase(external_id, kind).await?))
}

/// Raise an owned complex by one level.
pub async fn upgrade_complex(
    State(state): State<Arc<AppState>>,
    Path((external_id, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    let kind = parse::<ComplexKind>(&kind)?;
    Ok(Json(state.service.upgrade(external_id, kind).await?))
}

// ---------------------------------------------------------------------------
// Boosters and bonuses
// ---------------------------------------------------------------------------

/// The running booster and every offer.
pub async fn list_boosters(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    Ok(Json(state.service.list_boosters(external_id).await?))
}

/// Activate a booster.
pub async fn activate_booster(
    State(state): State<Arc<AppState>>,
    Path((external_id, kind)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    let kind = parse::<BoosterKind>(&kind)?;
    Ok(Json(state.service.activate_booster(external_id, kind).await?))
}

/// Claim today's daily bonus.
pub async fn claim_daily_bonus(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    Ok(Json(state.service.claim_daily_bonus(external_id).await?))
}

// ---------------------------------------------------------------------------
// Clicks
// ---------------------------------------------------------------------------

/// Record manual clicks. The response says whether this call flushed the
/// account's batch and how much it credited.
pub async fn record_clicks(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
    Json(request): Json<ClickRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    let receipt = state
        .service
        .record_manual_click(&state.clicks, external_id, request.clicks)
        .await?;
    Ok(Json(receipt))
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// The account's position on one metric.
pub async fn get_rank(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
    Query(params): Query<RankingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let external_id = parse_external_id(&external_id)?;
    let metric = parse_metric(params.metric.as_deref())?;
    Ok(Json(state.service.get_rank(external_id, metric).await?))
}

/// The top of the leaderboard projection.
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RankingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let metric = parse_metric(params.metric.as_deref())?;
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    Ok(Json(state.service.get_leaderboard(metric, limit).await?))
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_external_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid external id {raw}: {e}")))
}

fn parse<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ApiError::BadRequest(e.to_string()))
}

fn parse_metric(raw: Option<&str>) -> Result<RankingMetric, ApiError> {
    raw.map_or(Ok(RankingMetric::default()), parse::<RankingMetric>)
}
