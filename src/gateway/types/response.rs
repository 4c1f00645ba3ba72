//! API response envelope and error codes
//!
//! Every response, success or failure, is wrapped as
//! `{success, data, error, timestamp}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Unified API response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = true)]
    pub success: bool,
    /// Payload on success, null on failure
    pub data: Option<T>,
    /// Null on success
    pub error: Option<ErrorBody>,
    /// RFC 3339 UTC
    #[schema(example = "2024-12-22T16:00:00.000Z")]
    pub timestamp: String,
}

/// Error part of the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "INVALID_SIGNATURE")]
    pub code: String,
    pub message: String,
    /// Names of absent headers, only for `MISSING_HEADERS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: now_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::from_error(ErrorBody {
            code: code.to_string(),
            message: message.into(),
            missing: None,
        })
    }

    pub fn from_error(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            timestamp: now_rfc3339(),
        }
    }
}

/// `(status, envelope)` as a response.
pub fn respond<T: Serialize>(status: StatusCode, body: ApiResponse<T>) -> Response {
    (status, Json(body)).into_response()
}

/// Shorthand for an error envelope with a status.
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    respond(status, ApiResponse::error(code, message))
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Machine-readable error codes
pub mod error_codes {
    // Gate
    pub const INVALID_PROJECT: &str = "INVALID_PROJECT";
    pub const PROJECT_INACTIVE: &str = "PROJECT_INACTIVE";
    pub const MISSING_HEADERS: &str = "MISSING_HEADERS";
    pub const INVALID_HEADERS: &str = "INVALID_HEADERS";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const DEVICE_BANNED: &str = "DEVICE_BANNED";
    pub const TIMESTAMP_EXPIRED: &str = "TIMESTAMP_EXPIRED";
    pub const INVALID_SIGNATURE: &str = "INVALID_SIGNATURE";

    // Registration
    pub const MISSING_DEVICE_ID: &str = "MISSING_DEVICE_ID";
    pub const INVALID_DEVICE_ID: &str = "INVALID_DEVICE_ID";
    pub const INVALID_REQUEST_BODY: &str = "INVALID_REQUEST_BODY";

    // Admin
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const ADMIN_TOKEN_NOT_CONFIGURED: &str = "ADMIN_TOKEN_NOT_CONFIGURED";
    pub const PROJECT_NOT_FOUND: &str = "PROJECT_NOT_FOUND";

    // Infrastructure
    pub const POOL_EXHAUSTED: &str = "POOL_EXHAUSTED";
    pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success(serde_json::json!({"ok": 1}))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["ok"], 1);
        assert!(json["error"].is_null());
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_error_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::error(error_codes::NOT_FOUND, "nope")).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "nope");
        assert!(json["error"].get("missing").is_none());
    }
}
