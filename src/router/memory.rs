//! In-memory tenant pools for tests and embedded use.
//!
//! Device rows live in a [`MemoryDeviceStore`] shared by every pool the
//! connector hands out, so closing and rebuilding a pool keeps its data, the
//! same way a real backend outlives its connection pool.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::pool::{PoolConnector, TenantPool};
use crate::credentials::models::{DeviceRecord, InsertOutcome, NewDevice};
use crate::db::StoreError;
use crate::tenant::Tenant;

/// Device tables keyed by table name.
#[derive(Default)]
pub struct MemoryDeviceStore {
    tables: RwLock<HashMap<String, Vec<DeviceRecord>>>,
    next_id: AtomicI64,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ban a device. Returns `false` if no such row exists.
    pub fn ban(&self, table: &str, tenant_id: &str, device_id: &str, reason: Option<&str>) -> bool {
        let mut tables = self.write();
        let Some(row) = tables.get_mut(table).and_then(|rows| {
            rows.iter_mut()
                .find(|d| d.tenant_id == tenant_id && d.device_id == device_id)
        }) else {
            return false;
        };
        row.is_banned = true;
        row.ban_reason = reason.map(str::to_string);
        true
    }

    /// Snapshot of one row.
    pub fn get(&self, table: &str, tenant_id: &str, device_id: &str) -> Option<DeviceRecord> {
        self.read().get(table).and_then(|rows| {
            rows.iter()
                .find(|d| d.tenant_id == tenant_id && d.device_id == device_id)
                .cloned()
        })
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.read().get(table).map_or(0, Vec::len)
    }

    fn insert(&self, table: &str, tenant_id: &str, device: NewDevice) -> InsertOutcome {
        let mut tables = self.write();
        let rows = tables.entry(table.to_string()).or_default();
        let conflict = rows.iter().any(|d| {
            (d.tenant_id == tenant_id && d.device_id == device.device_id)
                || d.api_key == device.api_key
        });
        if conflict {
            return InsertOutcome::AlreadyExists;
        }

        let now = Utc::now();
        let record = DeviceRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            tenant_id: tenant_id.to_string(),
            device_id: device.device_id,
            api_key: device.api_key,
            secret_key: device.secret_key,
            metadata: device.metadata,
            is_banned: false,
            ban_reason: None,
            created_at: now,
            last_active_at: Some(now),
        };
        rows.push(record.clone());
        InsertOutcome::Inserted(record)
    }

    fn find(
        &self,
        table: &str,
        predicate: impl Fn(&DeviceRecord) -> bool,
    ) -> Option<DeviceRecord> {
        self.read()
            .get(table)
            .and_then(|rows| rows.iter().find(|d| predicate(d)).cloned())
    }

    fn touch(&self, table: &str, tenant_id: &str, row_id: i64) {
        if let Some(row) = self.write().get_mut(table).and_then(|rows| {
            rows.iter_mut()
                .find(|d| d.id == row_id && d.tenant_id == tenant_id)
        }) {
            row.last_active_at = Some(Utc::now());
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<DeviceRecord>>> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Vec<DeviceRecord>>> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct MemoryTenantPool {
    tenant_id: String,
    store: Arc<MemoryDeviceStore>,
    closed: AtomicBool,
    /// Simulated backend outage
    unavailable: AtomicBool,
}

impl MemoryTenantPool {
    pub fn new(tenant_id: impl Into<String>, store: Arc<MemoryDeviceStore>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            store,
            closed: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "pool for tenant {} is closed",
                self.tenant_id
            )));
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "backend for tenant {} unreachable",
                self.tenant_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantPool for MemoryTenantPool {
    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    async fn find_by_credentials(
        &self,
        table: &str,
        api_key: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        self.check()?;
        Ok(self.store.find(table, |d| {
            d.api_key == api_key && d.device_id == device_id && d.tenant_id == self.tenant_id
        }))
    }

    async fn find_by_device(
        &self,
        table: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        self.check()?;
        Ok(self
            .store
            .find(table, |d| d.device_id == device_id && d.tenant_id == self.tenant_id))
    }

    async fn insert_device(
        &self,
        table: &str,
        device: NewDevice,
    ) -> Result<InsertOutcome, StoreError> {
        self.check()?;
        Ok(self.store.insert(table, &self.tenant_id, device))
    }

    async fn touch_last_active(&self, table: &str, row_id: i64) -> Result<(), StoreError> {
        self.check()?;
        self.store.touch(table, &self.tenant_id, row_id);
        Ok(())
    }

    async fn ensure_schema(&self, _table_prefix: &str) -> Result<(), StoreError> {
        self.check()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Hands out [`MemoryTenantPool`]s over one shared device store.
#[derive(Default)]
pub struct MemoryConnector {
    store: Arc<MemoryDeviceStore>,
    rejected: Mutex<HashSet<String>>,
    connects: AtomicUsize,
    latest: DashMap<String, Arc<MemoryTenantPool>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Arc<MemoryDeviceStore> {
        &self.store
    }

    /// Refuse to build pools for this tenant, as if its routing target were bad.
    pub fn reject(&self, tenant_id: &str) {
        self.rejected_set().insert(tenant_id.to_string());
    }

    pub fn allow(&self, tenant_id: &str) {
        self.rejected_set().remove(tenant_id);
    }

    /// Number of pools built so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Most recently built pool for a tenant.
    pub fn latest_pool(&self, tenant_id: &str) -> Option<Arc<MemoryTenantPool>> {
        self.latest.get(tenant_id).map(|p| Arc::clone(p.value()))
    }

    fn rejected_set(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.rejected.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PoolConnector for MemoryConnector {
    fn connect(&self, tenant: &Tenant) -> Result<Arc<dyn TenantPool>, StoreError> {
        if self.rejected_set().contains(&tenant.id) {
            return Err(StoreError::Unavailable(format!(
                "tenant {}: routing target rejected",
                tenant.id
            )));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let pool = Arc::new(MemoryTenantPool::new(tenant.id.clone(), Arc::clone(&self.store)));
        self.latest.insert(tenant.id.clone(), Arc::clone(&pool));
        Ok(pool)
    }
}
