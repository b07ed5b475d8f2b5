//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the route table.

pub mod cookie;
pub mod query;
pub mod response;

// Re-export commonly used types
pub use cookie::parse_cookies;
pub use query::parse_query;
pub use response::{
    build_405_response, build_detail_response, build_json_response, build_raw_json_response,
    build_redirect_response, strip_body,
};
