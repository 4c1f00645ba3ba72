//! Ingest Gate - multi-tenant device authentication for an ingestion API
//!
//! Devices register once per tenant to obtain an API key and an HMAC secret,
//! then sign every request. The gate resolves the tenant, routes to its
//! backing store, and verifies the signature before any business handler runs.
//!
//! # Modules
//!
//! - [`codec`] - Canonical messages, HMAC signatures, key generation, format checks
//! - [`credentials`] - Device registration and at-rest secret sealing
//! - [`tenant`] - Tenant configuration store and in-memory registry
//! - [`router`] - One connection pool per tenant
//! - [`gate`] - Request authentication state machine and axum middleware
//! - [`gateway`] - HTTP routes, response envelope, OpenAPI
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing setup
//! - [`db`] - Control-plane database and store errors
//! - [`schema`] - Table bootstrap

pub mod clock;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod db;
pub mod gate;
pub mod gateway;
pub mod logging;
pub mod router;
pub mod schema;
pub mod tenant;

// Convenient re-exports at crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use credentials::{CredentialIssuer, IssuedCredential, PlaintextSealer, SecretSealer};
pub use gate::{AuthContext, AuthGate, GateError, GateErrorCode};
pub use gateway::state::AppState;
pub use router::{ConnectionRouter, PoolConnector, TenantPool};
pub use tenant::{Tenant, TenantRegistry, TenantStore};
