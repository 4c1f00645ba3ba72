//! Device registration handler

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes, error_response, respond};
use crate::credentials::{DeviceMetadata, IssueError};
use crate::db::StoreError;
use crate::gate::headers;

/// Registration request body
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Device UUID
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub device_id: Option<String>,
    #[schema(example = "Pixel 8")]
    pub device_model: Option<String>,
    #[schema(example = "Android 14")]
    pub os_version: Option<String>,
    #[schema(example = "2.3.1")]
    pub app_version: Option<String>,
}

/// Issued credentials
#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "api_live_3f2a9c0d1e4b5a6978c0d1e2f3a4b5c6")]
    pub api_key: String,
    /// HMAC key for request signing; returned on every registration of this device
    pub secret_key: String,
    /// `false` when the device was already registered
    pub is_new: bool,
}

/// Register a device and obtain its credentials
///
/// Idempotent per `(X-Project-ID, device_id)`: repeated calls return the same
/// key pair with `is_new = false`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    params(
        ("X-Project-ID" = Option<String>, Header, description = "Tenant id, defaults to `default`")
    ),
    responses(
        (status = 201, description = "Credentials issued", body = RegisterResponse),
        (status = 200, description = "Device already registered", body = RegisterResponse),
        (status = 400, description = "Missing or malformed device id, or invalid project"),
        (status = 503, description = "Tenant store unavailable")
    ),
    tag = "Auth"
)]
pub async fn register_device(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req: RegisterRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RegisterRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!("Unparsable registration body: {}", e);
                return error_response(
                    StatusCode::BAD_REQUEST,
                    error_codes::INVALID_REQUEST_BODY,
                    "Request body must be a JSON object",
                );
            }
        }
    };

    let Some(device_id) = req.device_id.filter(|d| !d.is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            error_codes::MISSING_DEVICE_ID,
            "device_id is required",
        );
    };

    let tenant_id = headers::project_id(&headers, state.gate.default_project());
    let metadata = DeviceMetadata {
        device_model: req.device_model,
        os_version: req.os_version,
        app_version: req.app_version,
    };

    match state.issuer.register(tenant_id, &device_id, metadata).await {
        Ok(issued) => {
            let status = if issued.is_new {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            respond(
                status,
                ApiResponse::success(RegisterResponse {
                    api_key: issued.api_key,
                    secret_key: issued.secret_key,
                    is_new: issued.is_new,
                }),
            )
        }
        Err(IssueError::InvalidDeviceId) => error_response(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_DEVICE_ID,
            "device_id must be a valid UUID",
        ),
        Err(IssueError::InvalidTenant(_)) => error_response(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PROJECT,
            "Invalid or inactive project",
        ),
        Err(IssueError::Store(StoreError::PoolExhausted)) => {
            tracing::error!(tenant_id, "Registration failed: pool exhausted");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::POOL_EXHAUSTED,
                "Service busy, retry later",
            )
        }
        Err(IssueError::Store(e)) => {
            tracing::error!(tenant_id, "Registration failed: {}", e);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::STORE_UNAVAILABLE,
                "Service temporarily unavailable",
            )
        }
        Err(e) => {
            tracing::error!(tenant_id, device_id, "Registration failed: {}", e);
            let message = if state.is_production() {
                "Internal server error".to_string()
            } else {
                e.to_string()
            };
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                message,
            )
        }
    }
}
