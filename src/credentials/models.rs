//! Device credential types.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Optional device descriptors supplied at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceMetadata {
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub app_version: Option<String>,
}

/// A row of the tenant's `<prefix>devices` table.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Row id
    pub id: i64,
    pub tenant_id: String,
    pub device_id: String,
    pub api_key: String,
    /// Stored form of the secret; open it with the sealer before use
    pub secret_key: String,
    pub metadata: DeviceMetadata,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRecord")
            .field("id", &self.id)
            .field("tenant_id", &self.tenant_id)
            .field("device_id", &self.device_id)
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("metadata", &self.metadata)
            .field("is_banned", &self.is_banned)
            .field("ban_reason", &self.ban_reason)
            .field("created_at", &self.created_at)
            .field("last_active_at", &self.last_active_at)
            .finish()
    }
}

/// Row to insert on first registration.
#[derive(Clone)]
pub struct NewDevice {
    pub device_id: String,
    pub api_key: String,
    /// Already sealed
    pub secret_key: String,
    pub metadata: DeviceMetadata,
}

/// Result of an insert guarded by the `(project_id, device_id)` unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(DeviceRecord),
    /// Another registration for the same device won the race
    AlreadyExists,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let record = DeviceRecord {
            id: 1,
            tenant_id: "t1".into(),
            device_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            api_key: "api_live_00000000000000000000000000000000".into(),
            secret_key: "topsecret".into(),
            metadata: DeviceMetadata::default(),
            is_banned: false,
            ban_reason: None,
            created_at: Utc::now(),
            last_active_at: None,
        };
        let rendered = format!("{record:?}");
        assert!(!rendered.contains("topsecret"));
    }
}
