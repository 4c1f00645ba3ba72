//! Per-tenant pool abstraction.
//!
//! A [`TenantPool`] owns the live connections to one tenant's backing store
//! and exposes the device-credential queries the core needs. Every query is
//! bound to the pool's tenant id in addition to the tenant-scoped table name.

use async_trait::async_trait;
use std::sync::Arc;

use crate::credentials::models::{DeviceRecord, InsertOutcome, NewDevice};
use crate::db::StoreError;
use crate::tenant::Tenant;

#[async_trait]
pub trait TenantPool: Send + Sync {
    /// Tenant this pool serves.
    fn tenant_id(&self) -> &str;

    /// Look up a device by API key *and* device id within this tenant.
    async fn find_by_credentials(
        &self,
        table: &str,
        api_key: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError>;

    /// Look up a device by device id within this tenant.
    async fn find_by_device(
        &self,
        table: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError>;

    /// Insert a new device. A `(tenant, device_id)` conflict is reported as
    /// [`InsertOutcome::AlreadyExists`], not as an error.
    async fn insert_device(&self, table: &str, device: NewDevice)
    -> Result<InsertOutcome, StoreError>;

    /// Set `last_active_at` to now. Idempotent.
    async fn touch_last_active(&self, table: &str, row_id: i64) -> Result<(), StoreError>;

    /// Create the tenant's tables if missing.
    async fn ensure_schema(&self, table_prefix: &str) -> Result<(), StoreError>;

    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Drain and close. Closing twice is a no-op.
    async fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Builds a pool from a tenant's routing target.
///
/// Must not block on the network: connections are established lazily on
/// first acquire.
pub trait PoolConnector: Send + Sync {
    fn connect(&self, tenant: &Tenant) -> Result<Arc<dyn TenantPool>, StoreError>;
}
