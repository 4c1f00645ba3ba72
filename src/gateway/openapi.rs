//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:3001/docs`
//! - OpenAPI JSON: `http://localhost:3001/api-docs/openapi.json`

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::{
    ClosePoolResponse, HealthResponse, InitResponse, ProjectHealthResponse, ProjectSummary,
    ProtectedTestResponse, RegisterRequest, RegisterResponse, ReloadResponse,
};
use crate::gateway::types::ErrorBody;

/// HMAC device signing and admin token schemes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "device_hmac",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Signature",
                    r#"HMAC-SHA256 device signature, base64.

Also required: X-API-Key, X-Device-ID, X-User-ID, X-Timestamp (ms), optional X-Project-ID.

Signed message (newline separated):
{method}\n{path_and_query}\n{timestamp}\n{device_id}\n{user_id}\n{body or "{}"}

Timestamps more than 5 minutes from server time are rejected."#,
                ))),
            );
            components.add_security_scheme(
                "admin_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Admin-Token"))),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ingest Gate API",
        version = "1.0.0",
        description = "Multi-tenant device registration and signed-request authentication."
    ),
    servers(
        (url = "http://localhost:3001", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::register::register_device,
        crate::gateway::handlers::protected::protected_test,
        crate::gateway::handlers::admin::list_projects,
        crate::gateway::handlers::admin::reload_project,
        crate::gateway::handlers::admin::close_project_pool,
        crate::gateway::handlers::admin::project_health,
        crate::gateway::handlers::admin::init_project,
    ),
    components(
        schemas(
            ErrorBody,
            HealthResponse,
            RegisterRequest,
            RegisterResponse,
            ProtectedTestResponse,
            ProjectSummary,
            ReloadResponse,
            ClosePoolResponse,
            ProjectHealthResponse,
            InitResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Device registration and signed requests"),
        (name = "Admin", description = "Tenant administration (admin token required)"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Ingest Gate API");
        assert!(spec.to_json().is_ok());
    }

    #[test]
    fn test_endpoints_registered() {
        let paths = ApiDoc::openapi().paths.paths;
        for path in [
            "/health",
            "/api/v1/auth/register",
            "/api/v1/protected/test",
            "/api/admin/projects",
            "/api/admin/projects/{id}/reload",
            "/api/admin/projects/{id}/pool",
            "/api/admin/projects/{id}/health",
            "/api/admin/projects/{id}/init",
        ] {
            assert!(paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn test_security_schemes_registered() {
        let components = ApiDoc::openapi().components.expect("should have components");
        assert!(components.security_schemes.contains_key("device_hmac"));
        assert!(components.security_schemes.contains_key("admin_token"));
    }
}
