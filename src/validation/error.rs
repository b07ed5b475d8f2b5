//! Field-addressed validation errors
//!
//! Every rejection names the failing location, the violated rule and the
//! offending input so a client can point at the exact field.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One step of an error location: an object key or a list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocPart {
    Key(String),
    Index(usize),
}

/// Location of a value inside a request, e.g. `["body", "images", 0, "url"]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Loc(Vec<LocPart>);

impl Loc {
    /// Location rooted at a request source (`path`, `query`, `body`, ...)
    pub fn root(source: &str) -> Self {
        Self(vec![LocPart::Key(source.to_string())])
    }

    pub fn key(&self, key: &str) -> Self {
        let mut parts = self.0.clone();
        parts.push(LocPart::Key(key.to_string()));
        Self(parts)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut parts = self.0.clone();
        parts.push(LocPart::Index(index));
        Self(parts)
    }

    #[cfg(test)]
    pub fn parts(&self) -> &[LocPart] {
        &self.0
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match part {
                LocPart::Key(key) => f.write_str(key)?,
                LocPart::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

/// Machine-readable rule identifier, serialized in `snake_case`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    IntType,
    IntParsing,
    IntFromFloat,
    FloatType,
    FloatParsing,
    BoolType,
    BoolParsing,
    UuidParsing,
    StringType,
    Enum,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    StringTooShort,
    StringTooLong,
    StringPatternMismatch,
    UrlType,
    UrlParsing,
    UrlScheme,
    ModelAttributesType,
    ListType,
    DictType,
    DatetimeParsing,
    TimeParsing,
    TimeDeltaParsing,
    JsonInvalid,
    ValueError,
}

/// A single failing field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub loc: Loc,
    pub msg: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Map<String, Value>>,
}

impl FieldError {
    pub fn new(kind: ErrorKind, loc: Loc, msg: impl Into<String>, input: Value) -> Self {
        Self {
            kind,
            loc,
            msg: msg.into(),
            input,
            ctx: None,
        }
    }

    /// Attach one constraint detail (e.g. `"ge": 1`)
    #[must_use]
    pub fn with_ctx(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.ctx
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn missing(loc: Loc) -> Self {
        Self::new(ErrorKind::Missing, loc, "Field required", Value::Null)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.msg)
    }
}

/// Accumulator that keeps every failure instead of stopping at the first
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn missing(&mut self, loc: Loc) {
        self.0.push(FieldError::missing(loc));
    }

    /// `Ok(())` when nothing failed, otherwise every collected error
    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

/// Render a numeric bound the way a client wrote it: `1` rather than `1.0`
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Format a bound for messages, without a trailing `.0` for whole numbers
pub fn number_text(n: f64) -> String {
    number_value(n).to_string()
}
