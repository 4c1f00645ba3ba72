//! HTTP handlers
//!
//! - `register`: device credential issuance
//! - `protected`: authenticated echo
//! - `health`: process and control-plane health
//! - `admin`: tenant reload, pool control

pub mod admin;
pub mod health;
pub mod protected;
pub mod register;

use axum::http::{StatusCode, Uri};
use axum::response::Response;

pub use admin::{
    ClosePoolResponse, InitResponse, ProjectHealthResponse, ProjectSummary, ReloadResponse,
    admin_auth_middleware, close_project_pool, init_project, list_projects, project_health,
    reload_project,
};
pub use health::{HealthResponse, health_check};
pub use protected::{ProtectedTestResponse, protected_test};
pub use register::{RegisterRequest, RegisterResponse, register_device};

use super::types::{error_codes, error_response};

/// Unmatched routes
pub async fn not_found(uri: Uri) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        error_codes::NOT_FOUND,
        format!("Route {} not found", uri.path()),
    )
}
