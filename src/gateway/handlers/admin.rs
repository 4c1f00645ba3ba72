//! Administrative tenant operations
//!
//! Guarded by a shared token from `X-Admin-Token` or `?token=`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes, error_response, respond};
use crate::router::PoolState;
use crate::tenant::RegistryError;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Rejects requests without the configured admin token.
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        tracing::error!("Admin endpoint called but no admin token is configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::ADMIN_TOKEN_NOT_CONFIGURED,
            "Admin token not configured",
        );
    };

    let provided = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| token_from_query(request.uri()));

    let authorized = provided
        .as_deref()
        .is_some_and(|p| bool::from(p.as_bytes().ct_eq(expected.as_bytes())));
    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Admin request with bad token");
        return error_response(
            StatusCode::UNAUTHORIZED,
            error_codes::UNAUTHORIZED,
            "Invalid or missing admin token",
        );
    }

    next.run(request).await
}

/// `?token=` from the URI, percent-decoded.
fn token_from_query(uri: &Uri) -> Option<String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .ok()
        .and_then(|Query(params)| params.get("token").cloned())
}

/// Cached tenant summary (no routing secrets)
#[derive(Serialize, ToSchema)]
pub struct ProjectSummary {
    pub project_id: String,
    pub project_name: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub table_prefix: String,
    pub is_active: bool,
    /// `absent`, `live` or `failed`
    pub pool: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReloadResponse {
    pub project_id: String,
    pub is_active: bool,
    /// Whether an open pool was closed so the next request rebuilds it
    pub pool_closed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ClosePoolResponse {
    pub project_id: String,
    /// `false` when no pool was open
    pub closed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectHealthResponse {
    pub project_id: String,
    pub is_active: bool,
    /// `connected` or `disconnected`
    pub database: &'static str,
    pub pool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct InitResponse {
    pub project_id: String,
    pub devices_table: String,
}

fn pool_label(state: &PoolState) -> String {
    match state {
        PoolState::Absent => "absent".to_string(),
        PoolState::Live => "live".to_string(),
        PoolState::Failed(_) => "failed".to_string(),
    }
}

fn not_found(project_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        error_codes::PROJECT_NOT_FOUND,
        format!("Project '{project_id}' not found"),
    )
}

fn unavailable(project_id: &str, e: impl std::fmt::Display) -> Response {
    tracing::error!(project_id, "Admin operation failed: {}", e);
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        error_codes::STORE_UNAVAILABLE,
        "Tenant store unavailable",
    )
}

/// List cached projects
#[utoipa::path(
    get,
    path = "/api/admin/projects",
    responses(
        (status = 200, description = "Cached projects", body = Vec<ProjectSummary>),
        (status = 503, description = "Control-plane store unavailable")
    ),
    security(("admin_token" = [])),
    tag = "Admin"
)]
pub async fn list_projects(State(state): State<Arc<AppState>>) -> Response {
    if let Err(e) = state.registry.initialize().await {
        return unavailable("*", e);
    }
    let mut projects: Vec<ProjectSummary> = state
        .registry
        .list()
        .into_iter()
        .map(|t| ProjectSummary {
            pool: pool_label(&state.router.state(&t.id)),
            project_id: t.id.clone(),
            project_name: t.name.clone(),
            db_host: t.routing.host.clone(),
            db_port: t.routing.port,
            db_name: t.routing.database.clone(),
            table_prefix: t.table_prefix.clone(),
            is_active: t.active,
        })
        .collect();
    projects.sort_by(|a, b| a.project_id.cmp(&b.project_id));
    respond(StatusCode::OK, ApiResponse::success(projects))
}

/// Reload a project's configuration and drop its pool
#[utoipa::path(
    post,
    path = "/api/admin/projects/{id}/reload",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Reloaded", body = ReloadResponse),
        (status = 404, description = "Project no longer exists")
    ),
    security(("admin_token" = [])),
    tag = "Admin"
)]
pub async fn reload_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Response {
    let exists = match state.registry.reload(&project_id).await {
        Ok(exists) => exists,
        Err(e) => return unavailable(&project_id, e),
    };
    // Routing may have changed; the next request builds a fresh pool.
    let pool_closed = state.router.close_pool(&project_id).await;
    if !exists {
        return not_found(&project_id);
    }

    let is_active = state
        .registry
        .cached(&project_id)
        .is_some_and(|t| t.active);
    tracing::info!(project_id, is_active, pool_closed, "Project reloaded");
    respond(
        StatusCode::OK,
        ApiResponse::success(ReloadResponse {
            project_id,
            is_active,
            pool_closed,
        }),
    )
}

/// Close a project's pool
#[utoipa::path(
    delete,
    path = "/api/admin/projects/{id}/pool",
    params(("id" = String, Path, description = "Project id")),
    responses((status = 200, description = "Pool closed or already absent", body = ClosePoolResponse)),
    security(("admin_token" = [])),
    tag = "Admin"
)]
pub async fn close_project_pool(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Json<ApiResponse<ClosePoolResponse>> {
    let closed = state.router.close_pool(&project_id).await;
    Json(ApiResponse::success(ClosePoolResponse { project_id, closed }))
}

/// Check a project's backing store
#[utoipa::path(
    get,
    path = "/api/admin/projects/{id}/health",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project health", body = ProjectHealthResponse),
        (status = 404, description = "Unknown project")
    ),
    security(("admin_token" = [])),
    tag = "Admin"
)]
pub async fn project_health(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Response {
    let tenant = match state.registry.resolve(&project_id).await {
        Ok(tenant) => tenant,
        Err(RegistryError::NotFound(_)) => return not_found(&project_id),
        Err(RegistryError::Store(e)) => return unavailable(&project_id, e),
    };

    let (database, detail) = match state.router.test_connection(&project_id).await {
        Ok(()) => ("connected", None),
        Err(e) => {
            tracing::warn!(project_id, "Project health check failed: {}", e);
            let detail = (!state.is_production()).then(|| e.to_string());
            ("disconnected", detail)
        }
    };

    respond(
        StatusCode::OK,
        ApiResponse::success(ProjectHealthResponse {
            pool: pool_label(&state.router.state(&project_id)),
            project_id,
            is_active: tenant.active,
            database,
            detail,
        }),
    )
}

/// Create the project's tables if missing
#[utoipa::path(
    post,
    path = "/api/admin/projects/{id}/init",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Tables ready", body = InitResponse),
        (status = 404, description = "Unknown project"),
        (status = 503, description = "Tenant store unavailable")
    ),
    security(("admin_token" = [])),
    tag = "Admin"
)]
pub async fn init_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Response {
    let tenant = match state.registry.resolve(&project_id).await {
        Ok(tenant) => tenant,
        Err(RegistryError::NotFound(_)) => return not_found(&project_id),
        Err(RegistryError::Store(e)) => return unavailable(&project_id, e),
    };
    let pool = match state.router.pool_for_tenant(&tenant) {
        Ok(pool) => pool,
        Err(e) => return unavailable(&project_id, e),
    };
    if let Err(e) = pool.ensure_schema(&tenant.table_prefix).await {
        return unavailable(&project_id, e);
    }

    respond(
        StatusCode::OK,
        ApiResponse::success(InitResponse {
            devices_table: tenant.table_name(crate::tenant::tables::DEVICES),
            project_id,
        }),
    )
}
