//! Tenant registry: the sole authority on tenant configuration.
//!
//! ## Components
//! - `models`: tenant and routing target types
//! - `store`: `TenantStore` trait with PostgreSQL and in-memory backends
//! - `registry`: process-lifetime cache with on-demand single-tenant reload

pub mod models;
pub mod registry;
pub mod store;

pub use models::{DEFAULT_TABLE_PREFIX, DEFAULT_TENANT_ID, RoutingTarget, Tenant, tables};
pub use registry::{RegistryError, TenantRegistry};
pub use store::{MemoryTenantStore, PgTenantStore, TenantStore};
