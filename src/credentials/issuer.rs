//! Device registration.
//!
//! `register` is idempotent per `(tenant, device_id)`. The unique key on that
//! pair arbitrates concurrent first registrations: the loser re-reads and
//! returns the winner's credentials.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::models::{DeviceMetadata, DeviceRecord, InsertOutcome, NewDevice};
use super::sealer::{SealError, SecretSealer};
use crate::codec::{is_valid_uuid, new_api_key, new_secret_key};
use crate::db::StoreError;
use crate::router::{ConnectionRouter, RouterError};
use crate::tenant::{RegistryError, TenantRegistry, tables};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("device id is not a valid UUID")]
    InvalidDeviceId,

    #[error("invalid or inactive project: {0}")]
    InvalidTenant(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Seal(#[from] SealError),

    /// Insert lost on the unique key but the winning row is not visible
    #[error("registration conflict for device {0}")]
    Conflict(String),
}

impl From<RouterError> for IssueError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::UnknownTenant(id) => IssueError::InvalidTenant(id),
            RouterError::PoolFailed { reason, .. } => {
                IssueError::Store(StoreError::Unavailable(reason))
            }
            RouterError::Store(e) => IssueError::Store(e),
        }
    }
}

impl From<RegistryError> for IssueError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => IssueError::InvalidTenant(id),
            RegistryError::Store(e) => IssueError::Store(e),
        }
    }
}

/// Credentials handed back to the device.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub api_key: String,
    pub secret_key: String,
    pub is_new: bool,
}

impl fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredential")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("is_new", &self.is_new)
            .finish()
    }
}

pub struct CredentialIssuer {
    registry: Arc<TenantRegistry>,
    router: Arc<ConnectionRouter>,
    sealer: Arc<dyn SecretSealer>,
}

impl CredentialIssuer {
    pub fn new(
        registry: Arc<TenantRegistry>,
        router: Arc<ConnectionRouter>,
        sealer: Arc<dyn SecretSealer>,
    ) -> Self {
        Self {
            registry,
            router,
            sealer,
        }
    }

    pub async fn register(
        &self,
        tenant_id: &str,
        device_id: &str,
        metadata: DeviceMetadata,
    ) -> Result<IssuedCredential, IssueError> {
        if !is_valid_uuid(device_id) {
            return Err(IssueError::InvalidDeviceId);
        }

        let tenant = self.registry.resolve(tenant_id).await?;
        if !tenant.active {
            return Err(IssueError::InvalidTenant(tenant_id.to_string()));
        }
        let pool = self.router.pool_for_tenant(&tenant)?;
        let table = tenant.table_name(tables::DEVICES);

        if let Some(existing) = pool.find_by_device(&table, device_id).await? {
            tracing::debug!(tenant_id, device_id, "Device already registered");
            return self.existing(existing);
        }

        let api_key = new_api_key();
        let secret_key = new_secret_key();
        let new_device = NewDevice {
            device_id: device_id.to_string(),
            api_key: api_key.clone(),
            secret_key: self.sealer.seal(&secret_key)?,
            metadata,
        };

        match pool.insert_device(&table, new_device).await? {
            InsertOutcome::Inserted(_) => {
                tracing::info!(tenant_id, device_id, "Device registered");
                Ok(IssuedCredential {
                    api_key,
                    secret_key,
                    is_new: true,
                })
            }
            InsertOutcome::AlreadyExists => {
                tracing::debug!(tenant_id, device_id, "Lost registration race, re-reading");
                match pool.find_by_device(&table, device_id).await? {
                    Some(existing) => self.existing(existing),
                    None => Err(IssueError::Conflict(device_id.to_string())),
                }
            }
        }
    }

    fn existing(&self, record: DeviceRecord) -> Result<IssuedCredential, IssueError> {
        Ok(IssuedCredential {
            secret_key: self.sealer.open(&record.secret_key)?,
            api_key: record.api_key,
            is_new: false,
        })
    }
}
