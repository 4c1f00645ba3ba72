pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
use crate::gate::auth_middleware;
use openapi::ApiDoc;
use state::AppState;

/// Assemble every route on top of the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Signed device routes
    let protected = Router::new()
        .route("/test", get(handlers::protected_test))
        .layer(from_fn_with_state(state.gate.clone(), auth_middleware));

    let admin = Router::new()
        .route("/projects", get(handlers::list_projects))
        .route("/projects/{id}/reload", post(handlers::reload_project))
        .route("/projects/{id}/pool", delete(handlers::close_project_pool))
        .route("/projects/{id}/health", get(handlers::project_health))
        .route("/projects/{id}/init", post(handlers::init_project))
        .layer(from_fn_with_state(
            state.clone(),
            handlers::admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/auth/register", post(handlers::register_device))
        .nest("/api/v1/protected", protected)
        .nest("/api/admin", admin)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.gate.body_limit()))
        .with_state(state)
}

/// Serve until SIGINT/SIGTERM, then close every tenant pool.
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API docs: http://{}/docs", addr);

    let app = build_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.router.close_all().await;
    if let Some(db) = &state.control_db {
        db.close().await;
    }
    Ok(())
}

/// Waits for SIGTERM or SIGINT.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
