//! Device credentials: issuance and at-rest secret handling.

pub mod issuer;
pub mod models;
pub mod sealer;

pub use issuer::{CredentialIssuer, IssueError, IssuedCredential};
pub use models::{DeviceMetadata, DeviceRecord, InsertOutcome, NewDevice};
pub use sealer::{PlaintextSealer, SealError, SecretSealer};
