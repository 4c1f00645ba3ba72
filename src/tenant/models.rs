//! Tenant (project) configuration.

use std::fmt;

/// Tenant used when a request carries no `X-Project-ID`.
pub const DEFAULT_TENANT_ID: &str = "default";

/// Prefix used when a tenant row has none.
pub const DEFAULT_TABLE_PREFIX: &str = "analytics_";

/// Base names of tenant-owned tables.
pub mod tables {
    pub const DEVICES: &str = "devices";
    pub const EVENTS: &str = "events";
    pub const SESSIONS: &str = "sessions";
}

/// Where a tenant's data lives.
#[derive(Clone, PartialEq, Eq)]
pub struct RoutingTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Stored form; passed through the secret sealer before use
    pub password: String,
}

impl fmt::Debug for RoutingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A tenant as held by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub routing: RoutingTarget,
    pub table_prefix: String,
    pub active: bool,
}

impl Tenant {
    /// Tenant-scoped table name: prefix + base.
    pub fn table_name(&self, base: &str) -> String {
        format!("{}{}", self.table_prefix, base)
    }
}
