//! Connection router: one pool per tenant.
//!
//! Each tenant has a slot that is absent, live or failed. A slot is filled on
//! first use and only emptied by [`ConnectionRouter::close_pool`] or
//! [`ConnectionRouter::close_all`]. A failed slot, or a live pool whose backend
//! has gone away, keeps reporting errors until an administrator closes it.

pub mod memory;
pub mod pool;
pub mod postgres;

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::db::StoreError;
use crate::tenant::{RegistryError, Tenant, TenantRegistry};

pub use memory::{MemoryConnector, MemoryDeviceStore, MemoryTenantPool};
pub use pool::{PoolConnector, TenantPool};
pub use postgres::{PgPoolConnector, PgTenantPool};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("pool for tenant {tenant_id} failed: {reason}")]
    PoolFailed { tenant_id: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RegistryError> for RouterError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => RouterError::UnknownTenant(id),
            RegistryError::Store(e) => RouterError::Store(e),
        }
    }
}

enum PoolSlot {
    Live(Arc<dyn TenantPool>),
    Failed(String),
}

/// Externally visible slot state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolState {
    Absent,
    Live,
    Failed(String),
}

pub struct ConnectionRouter {
    registry: Arc<TenantRegistry>,
    connector: Arc<dyn PoolConnector>,
    slots: DashMap<String, PoolSlot>,
}

impl ConnectionRouter {
    pub fn new(registry: Arc<TenantRegistry>, connector: Arc<dyn PoolConnector>) -> Self {
        Self {
            registry,
            connector,
            slots: DashMap::new(),
        }
    }

    /// Pool for a tenant id, resolving the tenant only when no slot exists.
    pub async fn pool_for(&self, tenant_id: &str) -> Result<Arc<dyn TenantPool>, RouterError> {
        if let Some(slot) = self.slots.get(tenant_id) {
            return Self::slot_result(tenant_id, slot.value());
        }
        let tenant = self.registry.resolve(tenant_id).await?;
        self.pool_for_tenant(&tenant)
    }

    /// Pool for an already-resolved tenant.
    ///
    /// The connector never touches the network, so building inside the map
    /// entry is cheap and guarantees one pool per tenant under contention.
    pub fn pool_for_tenant(&self, tenant: &Tenant) -> Result<Arc<dyn TenantPool>, RouterError> {
        let slot = self
            .slots
            .entry(tenant.id.clone())
            .or_insert_with(|| match self.connector.connect(tenant) {
                Ok(pool) => {
                    tracing::info!(tenant_id = %tenant.id, host = %tenant.routing.host, "Tenant pool created");
                    PoolSlot::Live(pool)
                }
                Err(e) => {
                    tracing::error!(tenant_id = %tenant.id, "Tenant pool creation failed: {}", e);
                    PoolSlot::Failed(e.to_string())
                }
            });
        Self::slot_result(&tenant.id, slot.value())
    }

    fn slot_result(tenant_id: &str, slot: &PoolSlot) -> Result<Arc<dyn TenantPool>, RouterError> {
        match slot {
            PoolSlot::Live(pool) => Ok(Arc::clone(pool)),
            PoolSlot::Failed(reason) => Err(RouterError::PoolFailed {
                tenant_id: tenant_id.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    /// Drain and drop a tenant's pool. Returns `false` if there was no slot.
    pub async fn close_pool(&self, tenant_id: &str) -> bool {
        let Some((_, slot)) = self.slots.remove(tenant_id) else {
            return false;
        };
        if let PoolSlot::Live(pool) = slot {
            pool.close().await;
        }
        tracing::info!(tenant_id, "Tenant pool closed");
        true
    }

    /// Close every pool. Returns how many slots were cleared.
    pub async fn close_all(&self) -> usize {
        let ids: Vec<String> = self.slots.iter().map(|s| s.key().clone()).collect();
        let mut closed = 0;
        for id in ids {
            if self.close_pool(&id).await {
                closed += 1;
            }
        }
        if closed > 0 {
            tracing::info!("Closed {} tenant pools", closed);
        }
        closed
    }

    /// Tenant-scoped table name.
    pub async fn table_name(&self, tenant_id: &str, base: &str) -> Result<String, RouterError> {
        let tenant = self.registry.resolve(tenant_id).await?;
        Ok(tenant.table_name(base))
    }

    /// Round-trip through the tenant's pool.
    pub async fn test_connection(&self, tenant_id: &str) -> Result<(), RouterError> {
        let pool = self.pool_for(tenant_id).await?;
        pool.ping().await?;
        Ok(())
    }

    pub fn state(&self, tenant_id: &str) -> PoolState {
        match self.slots.get(tenant_id).as_deref() {
            None => PoolState::Absent,
            Some(PoolSlot::Live(_)) => PoolState::Live,
            Some(PoolSlot::Failed(reason)) => PoolState::Failed(reason.clone()),
        }
    }

    pub fn pool_count(&self) -> usize {
        self.slots.len()
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }
}
