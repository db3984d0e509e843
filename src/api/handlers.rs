//! API Handlers
//!
//! Admin HTTP handlers; each one mirrors an operator console command.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::models::{
    ClearResponse, ExpirationRequest, ExpirationResponse, HealthResponse, RemoveResponse,
    RunResponse, SnapshotResponse, StatsResponse,
};
use crate::service::ResolutionService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: ResolutionService,
}

impl AppState {
    pub fn new(service: ResolutionService) -> Self {
        Self { service }
    }
}

/// Handler for GET /cache (`show-cache`)
pub async fn show_handler(State(state): State<AppState>) -> Json<SnapshotResponse> {
    Json(SnapshotResponse::new(state.service.show().await))
}

/// Handler for DELETE /cache (`clear-cache`)
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse::new(state.service.clear().await))
}

/// Handler for DELETE /cache/*key (`remove <key>`)
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<RemoveResponse>> {
    state.service.remove(&key).await?;
    Ok(Json(RemoveResponse::new(key)))
}

/// Handler for PUT /expiration (`set-expiration <ms>`)
pub async fn set_expiration_handler(
    State(state): State<AppState>,
    Json(req): Json<ExpirationRequest>,
) -> Json<ExpirationResponse> {
    state.service.set_expiration(req.ttl()).await;
    Json(ExpirationResponse::global(req.ttl_ms))
}

/// Handler for PUT /expiration/*key (`set-expiration-file <key> <ms>`)
pub async fn set_expiration_file_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ExpirationRequest>,
) -> Result<Json<ExpirationResponse>> {
    state.service.set_expiration_file(&key, req.ttl()).await?;
    Ok(Json(ExpirationResponse::restarted(key, req.ttl_ms)))
}

/// Handler for POST /run/*key (`run <key>`)
pub async fn run_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<RunResponse>> {
    let resolution = state.service.resolve(&key).await?;
    Ok(Json(RunResponse {
        key,
        size: resolution.payload.len(),
        outcome: resolution.outcome,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.service.report().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
