//! At-rest protection for stored secrets.
//!
//! Device secret keys and tenant backend passwords pass through a
//! [`SecretSealer`] on their way into and out of storage. The stored form is
//! opaque to everything else; the opened form is usable directly as an HMAC
//! key or a database password.
//!
//! [`PlaintextSealer`] is the identity transform: secrets are stored in
//! cleartext. That matches what existing deployments have on disk, so
//! switching to an encrypting sealer needs a data migration.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SealError {
    #[error("failed to seal secret: {0}")]
    Seal(String),

    #[error("failed to open sealed secret: {0}")]
    Open(String),
}

pub trait SecretSealer: Send + Sync {
    /// Transform a plaintext secret into its stored form.
    fn seal(&self, plaintext: &str) -> Result<String, SealError>;

    /// Recover the plaintext from its stored form.
    fn open(&self, stored: &str) -> Result<String, SealError>;
}

/// Stores secrets as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextSealer;

impl SecretSealer for PlaintextSealer {
    fn seal(&self, plaintext: &str) -> Result<String, SealError> {
        Ok(plaintext.to_string())
    }

    fn open(&self, stored: &str) -> Result<String, SealError> {
        Ok(stored.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_is_identity() {
        let sealer = PlaintextSealer;
        let sealed = sealer.seal("abc123").unwrap();
        assert_eq!(sealed, "abc123");
        assert_eq!(sealer.open(&sealed).unwrap(), "abc123");
    }
}
