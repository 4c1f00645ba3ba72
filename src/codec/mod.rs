//! Signature codec: canonical messages, HMAC signatures, credential generation
//! and identifier validation. Pure functions, no I/O.

pub mod keys;
pub mod signature;
pub mod validation;

pub use keys::{API_KEY_PREFIX, looks_like_api_key, new_api_key, new_event_id, new_secret_key};
pub use signature::{EMPTY_BODY, canonical_message, sign, sign_request, verify};
pub use validation::{is_valid_table_prefix, is_valid_user_id, is_valid_uuid};
