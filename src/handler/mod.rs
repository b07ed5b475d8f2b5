//! Request handler module
//!
//! Bridges hyper requests to the dispatcher and its JSON responses.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
