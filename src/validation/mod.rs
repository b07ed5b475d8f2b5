//! Validation module
//!
//! Turns raw request values into typed values or field-addressed rejections:
//! - Scalar coercion from text and JSON
//! - Numeric, length and pattern constraints
//! - Date, time and duration handling

mod coerce;
mod constraints;
mod error;
pub mod temporal;

pub use coerce::{json_to_f64, json_to_i64, json_to_string, text_to_i64, ScalarKind};
pub use constraints::Constraints;
pub use error::{ErrorKind, FieldError, FieldErrors, Loc};
