//! Authenticated request context.

use std::fmt;
use std::sync::Arc;

use crate::credentials::models::DeviceRecord;
use crate::router::TenantPool;
use crate::tenant::Tenant;

/// Attached to request extensions once a request passes the gate.
#[derive(Clone)]
pub struct AuthContext {
    pub tenant: Arc<Tenant>,
    pub pool: Arc<dyn TenantPool>,
    pub device: DeviceRecord,
    pub user_id: String,
}

impl AuthContext {
    /// Table name scoped to the authenticated tenant.
    pub fn table_name(&self, base: &str) -> String {
        self.tenant.table_name(base)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("tenant", &self.tenant.id)
            .field("device", &self.device)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
