//! Authentication header names and extraction.

use axum::http::HeaderMap;

pub const PROJECT_ID: &str = "X-Project-ID";
pub const API_KEY: &str = "X-API-Key";
pub const DEVICE_ID: &str = "X-Device-ID";
pub const USER_ID: &str = "X-User-ID";
pub const TIMESTAMP: &str = "X-Timestamp";
pub const SIGNATURE: &str = "X-Signature";

/// The five headers every signed request must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedHeaders<'a> {
    pub api_key: &'a str,
    pub device_id: &'a str,
    pub user_id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Header value as text. Absent, empty or non-ASCII values count as missing.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Tenant selected by `X-Project-ID`, or `default` when absent.
pub fn project_id<'a>(headers: &'a HeaderMap, default: &'a str) -> &'a str {
    header_str(headers, PROJECT_ID).unwrap_or(default)
}

/// Extract all signed-request headers, or the names of the ones missing.
pub fn extract(headers: &HeaderMap) -> Result<SignedHeaders<'_>, Vec<String>> {
    let names = [API_KEY, DEVICE_ID, USER_ID, TIMESTAMP, SIGNATURE];
    let values = names.map(|name| header_str(headers, name));

    match values {
        [Some(api_key), Some(device_id), Some(user_id), Some(timestamp), Some(signature)] => {
            Ok(SignedHeaders {
                api_key,
                device_id,
                user_id,
                timestamp,
                signature,
            })
        }
        _ => Err(names
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.to_string())
            .collect()),
    }
}
