//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::policy::Policy;

/// Application state shared across all handlers.
///
/// Holds the policy the server exposes; the client behind it is reached
/// through [`Policy::client`].
#[derive(Clone)]
pub struct AppState {
    pub policy: Policy,
}

impl AppState {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }
}

/// Handler for PUT /cache/:id
///
/// Stores a value with the request TTL, or the policy rule when none is given.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>, ApiError> {
    let ttl = req.ttl();
    state.policy.set(&id, req.value, ttl).await?;

    Ok(Json(SetResponse::new(id)))
}

/// Handler for GET /cache/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    match state.policy.get(&id).await? {
        Some(cached) => Ok(Json(GetResponse::new(
            id,
            state.policy.segment(),
            cached,
        ))),
        None => Err(ApiError::NotFound(id)),
    }
}

/// Handler for DELETE /cache/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.policy.remove(&id).await?;

    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for GET /stats
///
/// Engines that keep no counters report zeros.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.policy.client().stats().unwrap_or_default();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
///
/// Responds 503 while the cache client is not connected.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = state.policy.client().is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(HealthResponse::new(ready)))
}
