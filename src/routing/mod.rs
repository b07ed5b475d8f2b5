//! Routing module
//!
//! Provides method and path resolution for the route table:
//! - Path templates with named segments
//! - Method matching with `405` detection
//! - Trailing-slash redirect lookup

mod matcher;
mod template;

pub use matcher::{Resolution, Router};
pub use template::PathTemplate;

use thiserror::Error;

/// Route table construction errors
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid path template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("duplicate route {method} {path}")]
    Duplicate { method: String, path: String },

    #[error("route {method} {path}: path parameter `{name}` is not declared on both the template and the route")]
    PathParamMismatch {
        method: String,
        path: String,
        name: String,
    },
}
