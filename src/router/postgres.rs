//! PostgreSQL-backed tenant pools.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use std::sync::Arc;
use std::time::Duration;

use super::pool::{PoolConnector, TenantPool};
use crate::config::TenantPoolConfig;
use crate::credentials::models::{DeviceMetadata, DeviceRecord, InsertOutcome, NewDevice};
use crate::credentials::sealer::SecretSealer;
use crate::db::{SafeRow, StoreError, is_unique_violation};
use crate::tenant::Tenant;

const DEVICE_COLUMNS: &str = "id, project_id, device_id, api_key, secret_key, device_model, \
     os_version, app_version, is_banned, ban_reason, created_at, last_active_at";

pub struct PgTenantPool {
    tenant_id: String,
    pool: PgPool,
}

impl PgTenantPool {
    pub fn new(tenant_id: String, pool: PgPool) -> Self {
        Self { tenant_id, pool }
    }

    fn row_to_device(row: &PgRow) -> Result<DeviceRecord, StoreError> {
        Ok(DeviceRecord {
            id: row.require("id")?,
            tenant_id: row.require("project_id")?,
            device_id: row.require("device_id")?,
            api_key: row.require("api_key")?,
            secret_key: row.require("secret_key")?,
            metadata: DeviceMetadata {
                device_model: row.try_get_log::<Option<String>>("device_model").flatten(),
                os_version: row.try_get_log::<Option<String>>("os_version").flatten(),
                app_version: row.try_get_log::<Option<String>>("app_version").flatten(),
            },
            is_banned: row
                .try_get_log::<Option<bool>>("is_banned")
                .flatten()
                .unwrap_or(false),
            ban_reason: row.try_get_log::<Option<String>>("ban_reason").flatten(),
            created_at: row.require("created_at")?,
            last_active_at: row
                .try_get_log::<Option<DateTime<Utc>>>("last_active_at")
                .flatten(),
        })
    }
}

#[async_trait]
impl TenantPool for PgTenantPool {
    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    async fn find_by_credentials(
        &self,
        table: &str,
        api_key: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM {table} \
             WHERE api_key = $1 AND device_id = $2 AND project_id = $3"
        ))
        .bind(api_key)
        .bind(device_id)
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_device).transpose()
    }

    async fn find_by_device(
        &self,
        table: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {DEVICE_COLUMNS} FROM {table} WHERE device_id = $1 AND project_id = $2"
        ))
        .bind(device_id)
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_device).transpose()
    }

    async fn insert_device(
        &self,
        table: &str,
        device: NewDevice,
    ) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {table} \
             (device_id, api_key, secret_key, device_model, os_version, app_version, \
              project_id, created_at, last_active_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) \
             RETURNING {DEVICE_COLUMNS}"
        ))
        .bind(&device.device_id)
        .bind(&device.api_key)
        .bind(&device.secret_key)
        .bind(&device.metadata.device_model)
        .bind(&device.metadata.os_version)
        .bind(&device.metadata.app_version)
        .bind(&self.tenant_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(Self::row_to_device(&row)?)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn touch_last_active(&self, table: &str, row_id: i64) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "UPDATE {table} SET last_active_at = NOW() WHERE id = $1 AND project_id = $2"
        ))
        .bind(row_id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ensure_schema(&self, table_prefix: &str) -> Result<(), StoreError> {
        crate::schema::ensure_tenant_schema(&self.pool, table_prefix).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
        }
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// Creates lazily-connecting pools from tenant routing targets.
pub struct PgPoolConnector {
    settings: TenantPoolConfig,
    sealer: Arc<dyn SecretSealer>,
}

impl PgPoolConnector {
    pub fn new(settings: TenantPoolConfig, sealer: Arc<dyn SecretSealer>) -> Self {
        Self { settings, sealer }
    }

    fn connect_options(&self, tenant: &Tenant) -> Result<PgConnectOptions, StoreError> {
        let target = &tenant.routing;
        if target.host.is_empty() || target.port == 0 || target.database.is_empty() {
            return Err(StoreError::Unavailable(format!(
                "tenant {}: incomplete routing target",
                tenant.id
            )));
        }
        let password = self
            .sealer
            .open(&target.password)
            .map_err(|e| StoreError::Unavailable(format!("tenant {}: {}", tenant.id, e)))?;

        let mut options = PgConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .database(&target.database)
            .username(&target.user)
            .application_name("ingest_gate");
        if !password.is_empty() {
            options = options.password(&password);
        }
        Ok(options)
    }
}

impl PoolConnector for PgPoolConnector {
    fn connect(&self, tenant: &Tenant) -> Result<Arc<dyn TenantPool>, StoreError> {
        let options = self.connect_options(tenant)?;
        let pool = PgPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .min_connections(self.settings.min_connections)
            .acquire_timeout(Duration::from_millis(self.settings.acquire_timeout_ms))
            .idle_timeout(Some(Duration::from_millis(self.settings.idle_timeout_ms)))
            .connect_lazy_with(options);

        Ok(Arc::new(PgTenantPool::new(tenant.id.clone(), pool)))
    }
}
