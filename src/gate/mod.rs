//! Authentication gate for signed device requests.
//!
//! Verification flow, each step a terminal failure with its own code:
//! 1. Tenant id from `X-Project-ID` (default `default`)
//! 2. Resolve tenant -> `INVALID_PROJECT`
//! 3. Active flag -> `PROJECT_INACTIVE`
//! 4. Tenant pool and device table
//! 5. Required headers -> `MISSING_HEADERS` / `INVALID_HEADERS`
//! 6. Device lookup by API key + device id + tenant -> `INVALID_CREDENTIALS`
//! 7. Ban flag -> `DEVICE_BANNED`
//! 8. Timestamp within the replay window -> `TIMESTAMP_EXPIRED`
//! 9. HMAC over the canonical message -> `INVALID_SIGNATURE`
//! 10. Touch last-active in the background, return the context
//!
//! There is no nonce store: a captured request stays replayable for the
//! length of the window.

pub mod context;
pub mod error;
pub mod headers;
pub mod middleware;

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::codec::{is_valid_user_id, is_valid_uuid, looks_like_api_key, sign_request, verify};
use crate::config::AuthConfig;
use crate::credentials::sealer::SecretSealer;
use crate::router::ConnectionRouter;
use crate::tenant::{RegistryError, TenantRegistry, tables};

pub use context::AuthContext;
pub use error::{GateError, GateErrorCode};
pub use middleware::auth_middleware;

/// Default cap on buffered request bodies.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// What the gate needs from an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
    pub method: &'a str,
    /// Path and query exactly as received
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

pub struct AuthGate {
    registry: Arc<TenantRegistry>,
    router: Arc<ConnectionRouter>,
    sealer: Arc<dyn SecretSealer>,
    clock: Arc<dyn Clock>,
    replay_window_ms: u64,
    default_project: String,
    body_limit: usize,
}

impl AuthGate {
    pub fn new(
        registry: Arc<TenantRegistry>,
        router: Arc<ConnectionRouter>,
        sealer: Arc<dyn SecretSealer>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            registry,
            router,
            sealer,
            clock: Arc::new(SystemClock),
            replay_window_ms: config.replay_window_ms,
            default_project: config.default_project.clone(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    pub fn default_project(&self) -> &str {
        &self.default_project
    }

    pub async fn authenticate(&self, req: SignedRequest<'_>) -> Result<AuthContext, GateError> {
        // Steps 1-3: tenant
        let tenant_id = headers::project_id(req.headers, &self.default_project);
        let tenant = self.registry.resolve(tenant_id).await.map_err(|e| match e {
            RegistryError::NotFound(_) => GateError::from_code(GateErrorCode::InvalidProject),
            RegistryError::Store(e) => e.into(),
        })?;
        if !tenant.active {
            return Err(GateError::from_code(GateErrorCode::ProjectInactive));
        }

        // Step 4: pool
        let pool = self.router.pool_for_tenant(&tenant)?;
        let table = tenant.table_name(tables::DEVICES);

        // Step 5: headers
        let signed = headers::extract(req.headers).map_err(GateError::missing_headers)?;
        if !is_valid_uuid(signed.device_id) || !looks_like_api_key(signed.api_key) {
            return Err(GateError::from_code(GateErrorCode::InvalidCredentials));
        }
        if !is_valid_user_id(signed.user_id) {
            return Err(GateError::new(
                GateErrorCode::InvalidHeaders,
                format!("{} must be 32 hex characters", headers::USER_ID),
            ));
        }

        // Step 6: device
        let device = pool
            .find_by_credentials(&table, signed.api_key, signed.device_id)
            .await?
            .ok_or_else(|| GateError::from_code(GateErrorCode::InvalidCredentials))?;

        // Step 7: ban
        if device.is_banned {
            return Err(GateError::banned(device.ban_reason.as_deref()));
        }

        // Step 8: replay window, inclusive
        let timestamp: i64 = signed
            .timestamp
            .parse()
            .map_err(|_| GateError::from_code(GateErrorCode::TimestampExpired))?;
        if self.clock.now_ms().abs_diff(timestamp) > self.replay_window_ms {
            return Err(GateError::from_code(GateErrorCode::TimestampExpired));
        }

        // Step 9: signature
        let body = std::str::from_utf8(req.body)
            .map_err(|_| GateError::from_code(GateErrorCode::InvalidSignature))?;
        let secret = self.sealer.open(&device.secret_key).map_err(|e| {
            tracing::error!(tenant_id = %tenant.id, device_id = %device.device_id, "Cannot open device secret: {}", e);
            GateError::from_code(GateErrorCode::InternalError)
        })?;
        let expected = sign_request(
            req.method,
            req.path,
            timestamp,
            signed.device_id,
            signed.user_id,
            body,
            &secret,
        );
        if !verify(signed.signature, &expected) {
            return Err(GateError::from_code(GateErrorCode::InvalidSignature));
        }

        // Step 10: best-effort last-active
        {
            let pool = Arc::clone(&pool);
            let table = table.clone();
            let row_id = device.id;
            tokio::spawn(async move {
                if let Err(e) = pool.touch_last_active(&table, row_id).await {
                    tracing::warn!(tenant_id = pool.tenant_id(), row_id, "Failed to update last_active_at: {}", e);
                }
            });
        }

        Ok(AuthContext {
            tenant,
            pool,
            device,
            user_id: signed.user_id.to_string(),
        })
    }
}
