//! Gateway types
//!
//! - [`response`]: response envelope and error codes

pub mod response;

pub use response::{ApiResponse, ErrorBody, error_codes, error_response, respond};
