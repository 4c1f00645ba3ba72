//! Tenant configuration storage.
//!
//! Uses runtime queries to avoid sqlx compile-time database connection.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::models::{DEFAULT_TABLE_PREFIX, RoutingTarget, Tenant};
use crate::codec::is_valid_table_prefix;
use crate::db::{Database, SafeRow, StoreError};

/// Source of tenant rows for the registry.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// All tenants with the active flag set.
    async fn load_active(&self) -> Result<Vec<Tenant>, StoreError>;

    /// One tenant regardless of its active flag.
    async fn load_one(&self, tenant_id: &str) -> Result<Option<Tenant>, StoreError>;
}

const SELECT_COLUMNS: &str = r#"
    SELECT project_id, project_name, db_host, db_port, db_name, db_user,
           db_password_encrypted, table_prefix, is_active
    FROM analytics_projects
"#;

/// Tenant rows in the control-plane `analytics_projects` table.
pub struct PgTenantStore {
    db: Arc<Database>,
}

impl PgTenantStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_tenant(row: &sqlx::postgres::PgRow) -> Result<Tenant, StoreError> {
        let id: String = row.require("project_id")?;
        let port: i32 = row.require("db_port")?;
        let port = u16::try_from(port)
            .map_err(|_| StoreError::InvalidRow(format!("tenant {id}: db_port {port} out of range")))?;
        let table_prefix = row
            .try_get_log::<Option<String>>("table_prefix")
            .flatten()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
        if !is_valid_table_prefix(&table_prefix) {
            return Err(StoreError::InvalidRow(format!(
                "tenant {id}: table_prefix is not a valid identifier"
            )));
        }

        Ok(Tenant {
            name: row
                .try_get_log::<Option<String>>("project_name")
                .flatten()
                .unwrap_or_else(|| id.clone()),
            routing: RoutingTarget {
                host: row.require("db_host")?,
                port,
                database: row.require("db_name")?,
                user: row.require("db_user")?,
                password: row
                    .try_get_log::<Option<String>>("db_password_encrypted")
                    .flatten()
                    .unwrap_or_default(),
            },
            table_prefix,
            active: row.require("is_active")?,
            id,
        })
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn load_active(&self) -> Result<Vec<Tenant>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE is_active = TRUE"))
            .fetch_all(self.db.pool())
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            // One bad row must not keep every other tenant offline
            match Self::row_to_tenant(row) {
                Ok(tenant) => out.push(tenant),
                Err(e) => tracing::error!("Skipping tenant row: {}", e),
            }
        }
        Ok(out)
    }

    async fn load_one(&self, tenant_id: &str) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE project_id = $1"))
            .bind(tenant_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_tenant).transpose()
    }
}

/// In-process tenant table.
#[derive(Default)]
pub struct MemoryTenantStore {
    rows: RwLock<HashMap<String, Tenant>>,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenants(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let store = Self::new();
        for tenant in tenants {
            store.upsert(tenant);
        }
        store
    }

    pub fn upsert(&self, tenant: Tenant) {
        self.write().insert(tenant.id.clone(), tenant);
    }

    pub fn remove(&self, tenant_id: &str) -> Option<Tenant> {
        self.write().remove(tenant_id)
    }

    pub fn set_active(&self, tenant_id: &str, active: bool) -> bool {
        match self.write().get_mut(tenant_id) {
            Some(tenant) => {
                tenant.active = active;
                true
            }
            None => false,
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Tenant>> {
        self.rows.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Tenant>> {
        self.rows.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn load_active(&self) -> Result<Vec<Tenant>, StoreError> {
        Ok(self.read().values().filter(|t| t.active).cloned().collect())
    }

    async fn load_one(&self, tenant_id: &str) -> Result<Option<Tenant>, StoreError> {
        Ok(self.read().get(tenant_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str, active: bool) -> Tenant {
        Tenant {
            id: id.to_string(),
            name: id.to_string(),
            routing: RoutingTarget {
                host: "localhost".to_string(),
                port: 5432,
                database: id.to_string(),
                user: "postgres".to_string(),
                password: String::new(),
            },
            table_prefix: format!("{id}_"),
            active,
        }
    }

    #[tokio::test]
    async fn test_memory_load_active_filters_inactive() {
        let store = MemoryTenantStore::with_tenants([tenant("a", true), tenant("b", false)]);
        let active = store.load_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "a");
    }

    #[tokio::test]
    async fn test_memory_load_one_ignores_active_flag() {
        let store = MemoryTenantStore::with_tenants([tenant("b", false)]);
        let loaded = store.load_one("b").await.unwrap().unwrap();
        assert!(!loaded.active);
        assert!(store.load_one("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_set_active() {
        let store = MemoryTenantStore::with_tenants([tenant("a", true)]);
        assert!(store.set_active("a", false));
        assert!(!store.set_active("zzz", false));
        assert!(store.load_active().await.unwrap().is_empty());
    }
}
