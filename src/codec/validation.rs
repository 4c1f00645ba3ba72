//! Identifier format predicates.
//!
//! Checked before any database lookup so malformed input never costs I/O.

/// Hyphenated UUID, case-insensitive: `8-4-4-4-12` hex groups.
pub fn is_valid_uuid(value: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let mut parts = value.split('-');
    for len in GROUPS {
        match parts.next() {
            Some(part) if part.len() == len && is_hex(part) => {}
            _ => return false,
        }
    }
    parts.next().is_none()
}

/// Bare user id: exactly 32 lowercase hex chars, no separators.
pub fn is_valid_user_id(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// SQL identifier fragment usable as a table-name prefix.
///
/// Prefixes are interpolated into SQL text, so only `[A-Za-z_][A-Za-z0-9_]*`
/// is accepted.
pub fn is_valid_table_prefix(value: &str) -> bool {
    let mut bytes = value.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    value.len() <= 48 && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_hex(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_valid() {
        assert!(is_valid_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_uuid("550E8400-E29B-41D4-A716-446655440000"));
        assert!(is_valid_uuid(&uuid::Uuid::new_v4().to_string()));
    }

    #[test]
    fn test_uuid_invalid() {
        assert!(!is_valid_uuid(""));
        assert!(!is_valid_uuid("550e8400e29b41d4a716446655440000"));
        assert!(!is_valid_uuid("550e8400-e29b-41d4-a716-44665544000"));
        assert!(!is_valid_uuid("550e8400-e29b-41d4-a716-4466554400000"));
        assert!(!is_valid_uuid("550e8400-e29b-41d4-a716-446655440000-"));
        assert!(!is_valid_uuid("g50e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_valid_uuid("{550e8400-e29b-41d4-a716-446655440000}"));
    }

    #[test]
    fn test_user_id() {
        assert!(is_valid_user_id("550e8400e29b41d4a716446655440000"));
        assert!(!is_valid_user_id("550E8400E29B41D4A716446655440000"));
        assert!(!is_valid_user_id("550e8400e29b41d4a71644665544000F"));
        assert!(!is_valid_user_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_valid_user_id("550e8400e29b41d4a71644665544000"));
        assert!(!is_valid_user_id("zz0e8400e29b41d4a716446655440000"));
    }

    #[test]
    fn test_table_prefix() {
        assert!(is_valid_table_prefix("analytics_"));
        assert!(is_valid_table_prefix("_t1_"));
        assert!(!is_valid_table_prefix(""));
        assert!(!is_valid_table_prefix("1abc_"));
        assert!(!is_valid_table_prefix("a; DROP TABLE x; --"));
        assert!(!is_valid_table_prefix("a-b_"));
    }
}
