//! HMAC-SHA256 request signatures.
//!
//! Client and server build the same canonical message from a request and sign
//! it with the device's secret key. The signature travels base64-encoded in
//! the `X-Signature` header.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Separator between canonical message fields.
pub const FIELD_SEPARATOR: char = '\n';

/// Canonical body for requests without content.
pub const EMPTY_BODY: &str = "{}";

/// Build the canonical message for a request.
///
/// Field order is fixed: method, path, timestamp, device id, user id, body.
/// `path` is the full request path including the query string exactly as the
/// server observed it. An empty `body` is replaced by [`EMPTY_BODY`].
pub fn canonical_message(
    method: &str,
    path: &str,
    timestamp_ms: i64,
    device_id: &str,
    user_id: &str,
    body: &str,
) -> String {
    let body = if body.is_empty() { EMPTY_BODY } else { body };
    let sep = FIELD_SEPARATOR;
    format!("{method}{sep}{path}{sep}{timestamp_ms}{sep}{device_id}{sep}{user_id}{sep}{body}")
}

/// Sign a canonical message with a secret key.
///
/// The secret's UTF-8 bytes are the HMAC key. Returns the base64 digest.
pub fn sign(message: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Compare a claimed signature against the expected one.
///
/// Both sides are base64-decoded and compared in constant time. Anything that
/// fails to decode, or decodes to a different length, is simply a mismatch.
pub fn verify(claimed: &str, expected: &str) -> bool {
    let (Ok(claimed), Ok(expected)) = (STANDARD.decode(claimed), STANDARD.decode(expected)) else {
        return false;
    };
    if claimed.len() != expected.len() {
        return false;
    }
    claimed.ct_eq(&expected).into()
}

/// Build the canonical message for a request and sign it in one step.
pub fn sign_request(
    method: &str,
    path: &str,
    timestamp_ms: i64,
    device_id: &str,
    user_id: &str,
    body: &str,
    secret: &str,
) -> String {
    sign(
        &canonical_message(method, path, timestamp_ms, device_id, user_id, body),
        secret,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: &str = "550e8400-e29b-41d4-a716-446655440000";
    const USER: &str = "550e8400e29b41d4a716446655440000";
    const SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_canonical_message_field_order() {
        let msg = canonical_message("POST", "/api/v1/events?x=1", 1703260800001, DEVICE, USER, r#"{"a":1}"#);
        assert_eq!(
            msg,
            format!("POST\n/api/v1/events?x=1\n1703260800001\n{DEVICE}\n{USER}\n{{\"a\":1}}")
        );
    }

    #[test]
    fn test_canonical_message_empty_body() {
        let msg = canonical_message("GET", "/protected/test", 1, DEVICE, USER, "");
        assert!(msg.ends_with("\n{}"));
        assert_eq!(msg, canonical_message("GET", "/protected/test", 1, DEVICE, USER, "{}"));
    }

    #[test]
    fn test_sign_is_deterministic() {
        let msg = canonical_message("GET", "/p", 42, DEVICE, USER, "");
        assert_eq!(sign(&msg, SECRET), sign(&msg, SECRET));
        // SHA-256 digest: 32 bytes -> 44 base64 chars
        assert_eq!(sign(&msg, SECRET).len(), 44);
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let sig = sign("what do ya want for nothing?", "Jefe");
        assert_eq!(
            STANDARD.decode(sig).unwrap(),
            hex::decode("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843").unwrap()
        );
    }

    #[test]
    fn test_every_field_changes_signature() {
        let base = sign_request("GET", "/p?a=1", 1000, DEVICE, USER, "{}", SECRET);
        let variants = [
            sign_request("POST", "/p?a=1", 1000, DEVICE, USER, "{}", SECRET),
            sign_request("GET", "/p?a=2", 1000, DEVICE, USER, "{}", SECRET),
            sign_request("GET", "/p?a=1", 1001, DEVICE, USER, "{}", SECRET),
            sign_request("GET", "/p?a=1", 1000, "650e8400-e29b-41d4-a716-446655440000", USER, "{}", SECRET),
            sign_request("GET", "/p?a=1", 1000, DEVICE, "650e8400e29b41d4a716446655440000", "{}", SECRET),
            sign_request("GET", "/p?a=1", 1000, DEVICE, USER, "{ }", SECRET),
            sign_request("GET", "/p?a=1", 1000, DEVICE, USER, "{}", "other-secret"),
        ];
        for variant in &variants {
            assert_ne!(&base, variant);
            assert!(!verify(&base, variant));
        }
    }

    #[test]
    fn test_no_collisions_across_timestamps() {
        let mut seen = std::collections::HashSet::new();
        for ts in 0..500i64 {
            let sig = sign_request("POST", "/api/v1/events/track", ts, DEVICE, USER, r#"{"e":"x"}"#, SECRET);
            assert!(seen.insert(sig), "collision at ts={ts}");
        }
    }

    #[test]
    fn test_verify_matching() {
        let sig = sign_request("GET", "/p", 1, DEVICE, USER, "", SECRET);
        assert!(verify(&sig, &sig.clone()));
    }

    #[test]
    fn test_verify_malformed_is_false() {
        let sig = sign_request("GET", "/p", 1, DEVICE, USER, "", SECRET);
        assert!(!verify("not base64!!", &sig));
        assert!(!verify(&sig, "%%%"));
        assert!(!verify("", &sig));
        // valid base64, wrong length
        assert!(!verify("AAAA", &sig));
    }

    #[test]
    fn test_verify_wrong_bytes_same_length() {
        let sig = sign_request("GET", "/p", 1, DEVICE, USER, "", SECRET);
        let wrong = STANDARD.encode([0u8; 32]);
        assert!(!verify(&wrong, &sig));
    }
}
