//! Axum middleware wrapping [`AuthGate::authenticate`].

use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, OriginalUri, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::{AuthGate, SignedRequest, headers};
use crate::gateway::types::{error_codes, error_response};
use crate::logging::AUTH_TARGET;

/// Buffers the body, authenticates, and on success forwards the request with
/// an [`super::AuthContext`] extension and the body restored.
pub async fn auth_middleware(
    State(gate): State<Arc<AuthGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    // Limit comes from the router's `DefaultBodyLimit` layer.
    let bytes = match Bytes::from_request(Request::from_parts(parts.clone(), body), &()).await {
        Ok(bytes) => bytes,
        Err(rejection) => return body_rejection_response(&rejection),
    };

    // Nested routers rewrite `uri`; sign over what the client sent.
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| &uri.0)
        .unwrap_or(&parts.uri)
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let outcome = gate
        .authenticate(SignedRequest {
            method: parts.method.as_str(),
            path: &path,
            headers: &parts.headers,
            body: &bytes,
        })
        .await;

    match outcome {
        Ok(ctx) => {
            tracing::debug!(target: AUTH_TARGET, tenant_id = %ctx.tenant.id, device_id = %ctx.device.device_id, "Request authenticated");
            parts.extensions.insert(ctx);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(err) => {
            let tenant_id = headers::project_id(&parts.headers, gate.default_project());
            let device_id = headers::header_str(&parts.headers, headers::DEVICE_ID).unwrap_or("-");
            tracing::warn!(target: AUTH_TARGET, tenant_id, device_id, %path, code = err.code.name(), "Request rejected");
            err.into_response()
        }
    }
}

/// 413 when the body exceeds the limit, 400 when it could not be read.
fn body_rejection_response(rejection: &BytesRejection) -> Response {
    tracing::warn!(target: AUTH_TARGET, "Rejected request body: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            error_codes::PAYLOAD_TOO_LARGE,
            "Request body too large",
        )
    } else {
        error_response(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_REQUEST_BODY,
            "Failed to read request body",
        )
    }
}
