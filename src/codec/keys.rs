//! Credential and identifier generation.
//!
//! All randomness comes from the operating system CSPRNG.

use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;

/// Prefix marking a live (non-test) API key.
pub const API_KEY_PREFIX: &str = "api_live_";

/// API key length: prefix + 32 hex chars (128 bits).
pub const API_KEY_LEN: usize = API_KEY_PREFIX.len() + 32;

/// Secret key length: 64 hex chars (256 bits).
pub const SECRET_KEY_LEN: usize = 64;

/// Prefix for generated event identifiers.
pub const EVENT_ID_PREFIX: &str = "evt_";

fn random_hex<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a new API key: `api_live_` + 128 random bits as hex.
pub fn new_api_key() -> String {
    format!("{}{}", API_KEY_PREFIX, random_hex::<16>())
}

/// Generate a new secret key: 256 random bits as hex.
///
/// This is the HMAC key. Never log it.
pub fn new_secret_key() -> String {
    random_hex::<32>()
}

/// Generate an event id: `evt_<unix millis>_<8 hex chars>`.
pub fn new_event_id() -> String {
    format!(
        "{}{}_{}",
        EVENT_ID_PREFIX,
        Utc::now().timestamp_millis(),
        random_hex::<4>()
    )
}

/// Cheap shape check for an API key. Not a security control.
pub fn looks_like_api_key(value: &str) -> bool {
    value.len() == API_KEY_LEN
        && value
            .strip_prefix(API_KEY_PREFIX)
            .is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_api_key_format() {
        let key = new_api_key();
        assert!(key.starts_with("api_live_"));
        assert_eq!(key.len(), 41);
        assert!(looks_like_api_key(&key));
    }

    #[test]
    fn test_secret_key_format() {
        let secret = new_secret_key();
        assert_eq!(secret.len(), SECRET_KEY_LEN);
        assert!(secret.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<_> = (0..200).map(|_| new_api_key()).collect();
        assert_eq!(keys.len(), 200);
        let secrets: HashSet<_> = (0..200).map(|_| new_secret_key()).collect();
        assert_eq!(secrets.len(), 200);
    }

    #[test]
    fn test_event_id_format() {
        let id = new_event_id();
        let rest = id.strip_prefix("evt_").unwrap();
        let (millis, suffix) = rest.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn test_looks_like_api_key_rejects() {
        assert!(!looks_like_api_key("api_test_0123456789abcdef0123456789abcdef"));
        assert!(!looks_like_api_key("api_live_0123"));
        assert!(!looks_like_api_key("api_live_0123456789abcdef0123456789abcdeg"));
    }
}
