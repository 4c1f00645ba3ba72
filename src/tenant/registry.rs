//! In-memory tenant registry.
//!
//! Cold start loads every active tenant once. After that lookups are served
//! from a concurrent map; a miss triggers exactly one single-row reload before
//! the tenant is declared unknown. Entries are only replaced or removed by an
//! explicit [`TenantRegistry::reload`].

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

use super::models::Tenant;
use super::store::TenantStore;
use crate::db::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown tenant: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct TenantRegistry {
    store: Arc<dyn TenantStore>,
    tenants: DashMap<String, Arc<Tenant>>,
    /// Set once the cold-start load succeeded
    loaded: OnceCell<()>,
}

impl TenantRegistry {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self {
            store,
            tenants: DashMap::new(),
            loaded: OnceCell::new(),
        }
    }

    /// Load all active tenants. Runs at most once successfully; concurrent
    /// callers wait for the same load. A failed load is retried by the next
    /// caller.
    pub async fn initialize(&self) -> Result<usize, StoreError> {
        self.loaded
            .get_or_try_init(|| async {
                let tenants = self.store.load_active().await?;
                for tenant in tenants {
                    self.tenants.insert(tenant.id.clone(), Arc::new(tenant));
                }
                tracing::info!("Loaded {} tenant configurations", self.tenants.len());
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(self.tenants.len())
    }

    /// Resolve a tenant by id.
    ///
    /// Inactive tenants resolve normally; callers check `active`.
    pub async fn resolve(&self, tenant_id: &str) -> Result<Arc<Tenant>, RegistryError> {
        self.initialize().await?;

        if let Some(tenant) = self.tenants.get(tenant_id) {
            return Ok(Arc::clone(tenant.value()));
        }

        // Created after cold start?
        match self.store.load_one(tenant_id).await? {
            Some(tenant) => {
                let tenant = Arc::new(tenant);
                self.tenants.insert(tenant_id.to_string(), Arc::clone(&tenant));
                tracing::info!(tenant_id, "Tenant loaded on demand");
                Ok(tenant)
            }
            None => Err(RegistryError::NotFound(tenant_id.to_string())),
        }
    }

    /// Refresh one tenant after an administrative update.
    ///
    /// Returns `false` when the tenant no longer exists; its cached entry is
    /// dropped in that case.
    pub async fn reload(&self, tenant_id: &str) -> Result<bool, StoreError> {
        match self.store.load_one(tenant_id).await? {
            Some(tenant) => {
                tracing::info!(tenant_id, active = tenant.active, "Tenant reloaded");
                self.tenants.insert(tenant_id.to_string(), Arc::new(tenant));
                Ok(true)
            }
            None => {
                if self.tenants.remove(tenant_id).is_some() {
                    tracing::warn!(tenant_id, "Tenant deleted, dropped from registry");
                }
                Ok(false)
            }
        }
    }

    /// Cached entry without touching the store.
    pub fn cached(&self, tenant_id: &str) -> Option<Arc<Tenant>> {
        self.tenants.get(tenant_id).map(|t| Arc::clone(t.value()))
    }

    /// Snapshot of every cached tenant.
    pub fn list(&self) -> Vec<Arc<Tenant>> {
        self.tenants.iter().map(|t| Arc::clone(t.value())).collect()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
