use std::sync::Arc;
use std::time::Instant;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::credentials::{CredentialIssuer, SecretSealer};
use crate::db::Database;
use crate::gate::AuthGate;
use crate::router::ConnectionRouter;
use crate::tenant::TenantRegistry;

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TenantRegistry>,
    pub router: Arc<ConnectionRouter>,
    pub issuer: Arc<CredentialIssuer>,
    pub gate: Arc<AuthGate>,
    /// Control-plane database; absent when running on in-memory stores
    pub control_db: Option<Arc<Database>>,
    pub admin_token: Option<String>,
    pub environment: String,
    /// Hide error detail from clients
    production: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        registry: Arc<TenantRegistry>,
        router: Arc<ConnectionRouter>,
        sealer: Arc<dyn SecretSealer>,
        clock: Arc<dyn Clock>,
        control_db: Option<Arc<Database>>,
    ) -> Self {
        let gate = AuthGate::new(
            Arc::clone(&registry),
            Arc::clone(&router),
            Arc::clone(&sealer),
            &config.auth,
        )
        .with_clock(clock)
        .with_body_limit(config.gateway.body_limit_bytes);
        let issuer = CredentialIssuer::new(Arc::clone(&registry), Arc::clone(&router), sealer);

        Self {
            registry,
            router,
            issuer: Arc::new(issuer),
            gate: Arc::new(gate),
            control_db,
            admin_token: config.admin_token.clone().filter(|t| !t.is_empty()),
            environment: config.environment.clone(),
            production: config.is_production(),
            started_at: Instant::now(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.production
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::credentials::PlaintextSealer;
    use crate::router::MemoryConnector;
    use crate::tenant::MemoryTenantStore;

    fn state_for(config: &AppConfig) -> AppState {
        let registry = Arc::new(TenantRegistry::new(Arc::new(MemoryTenantStore::new())));
        let router = Arc::new(ConnectionRouter::new(
            registry.clone(),
            Arc::new(MemoryConnector::new()),
        ));
        AppState::new(
            config,
            registry,
            router,
            Arc::new(PlaintextSealer),
            Arc::new(SystemClock),
            None,
        )
    }

    #[test]
    fn test_production_flag_follows_config() {
        let dev = AppConfig::from_yaml(include_str!("../../config/dev.yaml")).unwrap();
        let state = state_for(&dev);
        assert!(!state.is_production());
        assert_eq!(state.admin_token.as_deref(), Some("dev-admin-token"));

        let prod = AppConfig::from_yaml(include_str!("../../config/prod.yaml")).unwrap();
        let state = state_for(&prod);
        assert!(state.is_production());
        assert!(state.admin_token.is_none());
    }
}
