//! Dispatch module
//!
//! Turns a raw request into a handler call:
//! - Route records declaring parameters, body fields and the handler
//! - Decoding by declared source (path, query, header, cookie, body)
//! - Constraint validation, then the handler

mod decoder;
mod dispatcher;
mod error;
mod spec;

pub use decoder::RequestParts;
pub use dispatcher::{Dispatcher, Outcome};
pub use error::DispatchError;
pub use spec::{BodyField, BodyKind, Inputs, NamedExample, ParamSource, ParamSpec, RouteSpec};
