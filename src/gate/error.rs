//! Authentication error types.
//!
//! Every rejection is one `GateError` rendered into the standard envelope.
//! Infrastructure failures carry a generic message; details stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::db::StoreError;
use crate::gateway::types::{ApiResponse, ErrorBody, error_codes, respond};
use crate::router::RouterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateErrorCode {
    /// Unknown tenant
    InvalidProject,
    /// Tenant exists but is disabled
    ProjectInactive,
    MissingHeaders,
    /// A header is present but malformed
    InvalidHeaders,
    InvalidCredentials,
    DeviceBanned,
    TimestampExpired,
    InvalidSignature,
    PoolExhausted,
    StoreUnavailable,
    InternalError,
}

impl GateErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidProject => error_codes::INVALID_PROJECT,
            Self::ProjectInactive => error_codes::PROJECT_INACTIVE,
            Self::MissingHeaders => error_codes::MISSING_HEADERS,
            Self::InvalidHeaders => error_codes::INVALID_HEADERS,
            Self::InvalidCredentials => error_codes::INVALID_CREDENTIALS,
            Self::DeviceBanned => error_codes::DEVICE_BANNED,
            Self::TimestampExpired => error_codes::TIMESTAMP_EXPIRED,
            Self::InvalidSignature => error_codes::INVALID_SIGNATURE,
            Self::PoolExhausted => error_codes::POOL_EXHAUSTED,
            Self::StoreUnavailable => error_codes::STORE_UNAVAILABLE,
            Self::InternalError => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidProject | Self::MissingHeaders | Self::InvalidHeaders => {
                StatusCode::BAD_REQUEST
            }
            Self::ProjectInactive | Self::DeviceBanned => StatusCode::FORBIDDEN,
            Self::InvalidCredentials | Self::TimestampExpired | Self::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            Self::PoolExhausted | Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Infrastructure fault the client may retry with backoff.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::PoolExhausted | Self::StoreUnavailable)
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::InvalidProject => "Invalid project ID",
            Self::ProjectInactive => "Project is inactive",
            Self::MissingHeaders => "Missing authentication headers",
            Self::InvalidHeaders => "Malformed authentication headers",
            Self::InvalidCredentials => "Invalid API key or device ID",
            Self::DeviceBanned => "Device has been banned",
            Self::TimestampExpired => "Request timestamp expired",
            Self::InvalidSignature => "Invalid signature",
            Self::PoolExhausted => "Service busy, retry later",
            Self::StoreUnavailable => "Service temporarily unavailable",
            Self::InternalError => "Internal server error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateError {
    pub code: GateErrorCode,
    pub message: String,
    /// Only set for `MissingHeaders`
    pub missing: Vec<String>,
}

impl GateError {
    pub fn new(code: GateErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            missing: Vec::new(),
        }
    }

    pub fn from_code(code: GateErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn missing_headers(missing: Vec<String>) -> Self {
        Self {
            code: GateErrorCode::MissingHeaders,
            message: format!("Missing required headers: {}", missing.join(", ")),
            missing,
        }
    }

    pub fn banned(reason: Option<&str>) -> Self {
        match reason {
            Some(reason) if !reason.is_empty() => Self::new(
                GateErrorCode::DeviceBanned,
                format!("Device has been banned: {reason}"),
            ),
            _ => Self::from_code(GateErrorCode::DeviceBanned),
        }
    }
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.name(), self.message)
    }
}

impl std::error::Error for GateError {}

impl From<StoreError> for GateError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Store failure during authentication: {}", e);
        match e {
            StoreError::PoolExhausted => Self::from_code(GateErrorCode::PoolExhausted),
            StoreError::Unavailable(_) => Self::from_code(GateErrorCode::StoreUnavailable),
            StoreError::InvalidRow(_) => Self::from_code(GateErrorCode::InternalError),
        }
    }
}

impl From<RouterError> for GateError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::UnknownTenant(_) => Self::from_code(GateErrorCode::InvalidProject),
            RouterError::PoolFailed { tenant_id, reason } => {
                tracing::error!(%tenant_id, "Tenant pool unusable: {}", reason);
                Self::from_code(GateErrorCode::StoreUnavailable)
            }
            RouterError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.name().to_string(),
            message: self.message,
            missing: (!self.missing.is_empty()).then_some(self.missing),
        };
        respond(self.code.http_status(), ApiResponse::from_error(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status() {
        use GateErrorCode::*;
        let expected = [
            (InvalidProject, 400),
            (ProjectInactive, 403),
            (MissingHeaders, 400),
            (InvalidHeaders, 400),
            (InvalidCredentials, 401),
            (DeviceBanned, 403),
            (TimestampExpired, 401),
            (InvalidSignature, 401),
            (PoolExhausted, 503),
            (StoreUnavailable, 503),
            (InternalError, 500),
        ];
        for (code, status) in expected {
            assert_eq!(code.http_status().as_u16(), status, "{}", code.name());
        }
    }

    #[test]
    fn test_only_infrastructure_is_retryable() {
        assert!(GateErrorCode::PoolExhausted.is_retryable());
        assert!(GateErrorCode::StoreUnavailable.is_retryable());
        assert!(!GateErrorCode::InvalidSignature.is_retryable());
        assert!(!GateErrorCode::TimestampExpired.is_retryable());
    }

    #[test]
    fn test_store_errors_do_not_leak_detail() {
        let err: GateError = StoreError::Unavailable("password=hunter2 host=db".into()).into();
        assert_eq!(err.code, GateErrorCode::StoreUnavailable);
        assert!(!err.message.contains("hunter2"));

        let err: GateError = StoreError::PoolExhausted.into();
        assert_eq!(err.code, GateErrorCode::PoolExhausted);
    }

    #[test]
    fn test_router_errors() {
        let err: GateError = RouterError::UnknownTenant("x".into()).into();
        assert_eq!(err.code, GateErrorCode::InvalidProject);
        let err: GateError = RouterError::PoolFailed {
            tenant_id: "x".into(),
            reason: "bad host".into(),
        }
        .into();
        assert_eq!(err.code, GateErrorCode::StoreUnavailable);
    }

    #[test]
    fn test_missing_headers_lists_names() {
        let err = GateError::missing_headers(vec!["X-API-Key".into(), "X-Signature".into()]);
        assert_eq!(err.code, GateErrorCode::MissingHeaders);
        assert!(err.message.contains("X-API-Key, X-Signature"));
    }

    #[test]
    fn test_banned_reason() {
        assert!(GateError::banned(Some("spam")).message.contains("spam"));
        assert_eq!(
            GateError::banned(None).message,
            GateErrorCode::DeviceBanned.default_message()
        );
    }
}
