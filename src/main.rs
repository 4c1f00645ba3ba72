//! Ingest Gate server
//!
//! ```text
//! request ─▶ Gate ─▶ TenantRegistry ─▶ ConnectionRouter ─▶ tenant store
//!             │                                               │
//!             └──────── HMAC verify ◀── device secret ◀───────┘
//! ```
//!
//! Usage: `ingest_gate [--env dev|prod] [--port N]`

use std::sync::Arc;

use anyhow::Context;
use ingest_gate::config::AppConfig;
use ingest_gate::credentials::{PlaintextSealer, SecretSealer};
use ingest_gate::db::Database;
use ingest_gate::gateway::{run_server, state::AppState};
use ingest_gate::router::{ConnectionRouter, PgPoolConnector};
use ingest_gate::tenant::{PgTenantStore, TenantRegistry};
use ingest_gate::{SystemClock, logging, schema};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env).with_context(|| format!("loading config for '{env}'"))?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }
    let _log_guard = logging::init_logging(&config);

    tracing::info!(
        "Starting ingest_gate {} ({}) in {} mode",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        config.environment
    );

    let db = Arc::new(
        Database::connect(&config.control_db)
            .await
            .context("connecting to control-plane database")?,
    );
    // Secrets are stored in cleartext until an encrypting sealer is configured.
    let sealer: Arc<dyn SecretSealer> = Arc::new(PlaintextSealer);

    if config.auto_init_schema {
        let mut target = schema::routing_from_url(&config.control_db.url)
            .context("control_db.url must name host and database")?;
        target.password = sealer.seal(&target.password)?;
        schema::ensure_control_schema(db.pool(), &target).await?;
    }

    let registry = Arc::new(TenantRegistry::new(Arc::new(PgTenantStore::new(db.clone()))));
    let tenants = registry.initialize().await.context("loading tenants")?;
    tracing::info!("{} active tenants", tenants);

    let connector = Arc::new(PgPoolConnector::new(
        config.tenant_pool.clone(),
        sealer.clone(),
    ));
    let router = Arc::new(ConnectionRouter::new(registry.clone(), connector));

    if config.auto_init_schema {
        for tenant in registry.list().into_iter().filter(|t| t.active) {
            let result = match router.pool_for_tenant(&tenant) {
                Ok(pool) => pool.ensure_schema(&tenant.table_prefix).await.map_err(Into::into),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(tenant_id = %tenant.id, "Tenant schema init failed: {}", e);
            }
        }
    }

    let state = Arc::new(AppState::new(
        &config,
        registry,
        router,
        sealer,
        Arc::new(SystemClock),
        Some(db),
    ));

    run_server(&config.gateway, state).await
}
