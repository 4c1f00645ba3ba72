//! Authenticated echo endpoint

use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::super::types::ApiResponse;
use crate::gate::AuthContext;

#[derive(Serialize, ToSchema)]
pub struct ProtectedTestResponse {
    #[schema(example = "Authentication successful")]
    pub message: String,
    pub project_id: String,
    pub device_id: String,
    pub user_id: String,
    pub device_model: Option<String>,
    pub last_active: Option<DateTime<Utc>>,
}

/// Verify request signing end to end
#[utoipa::path(
    get,
    path = "/api/v1/protected/test",
    responses(
        (status = 200, description = "Signature accepted", body = ProtectedTestResponse),
        (status = 401, description = "Credentials, timestamp or signature rejected"),
        (status = 403, description = "Project inactive or device banned")
    ),
    security(("device_hmac" = [])),
    tag = "Auth"
)]
pub async fn protected_test(
    Extension(ctx): Extension<AuthContext>,
) -> Json<ApiResponse<ProtectedTestResponse>> {
    Json(ApiResponse::success(ProtectedTestResponse {
        message: "Authentication successful".to_string(),
        project_id: ctx.tenant.id.clone(),
        device_id: ctx.device.device_id.clone(),
        user_id: ctx.user_id.clone(),
        device_model: ctx.device.metadata.device_model.clone(),
        last_active: ctx.device.last_active_at,
    }))
}
