//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiResponse;

/// Health check response data
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// `connected`, `disconnected` or `not_configured`
    #[schema(example = "connected")]
    pub database: &'static str,
    /// Seconds since start
    pub uptime_secs: f64,
    #[schema(example = "development")]
    pub environment: String,
    pub version: &'static str,
    pub git_hash: &'static str,
    /// Tenants currently cached
    pub tenants: usize,
    /// Tenant pools currently open
    pub pools: usize,
}

/// Service health
///
/// Always 200 while the process serves requests; `database` reports the
/// control-plane connection.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let database = match &state.control_db {
        Some(db) => match db.health_check().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::error!("[HEALTH] Control-plane ping failed: {}", e);
                "disconnected"
            }
        },
        None => "not_configured",
    };

    Json(ApiResponse::success(HealthResponse {
        status: "healthy",
        database,
        uptime_secs: state.started_at.elapsed().as_secs_f64(),
        environment: state.environment.clone(),
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        tenants: state.registry.len(),
        pools: state.router.pool_count(),
    }))
}
