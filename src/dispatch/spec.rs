//! Declarative route records
//!
//! A route is plain data: method, path template, the parameters it reads,
//! its body fields and a handler function pointer. The dispatcher interprets
//! these records; handlers never see raw request text.

use hyper::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use super::DispatchError;
use crate::models::{Model, TypeDescriptor};
use crate::validation::{Constraints, ScalarKind};

/// Where a parameter is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamSource {
    /// First element of error locations and the OpenAPI `in` value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// One scalar parameter read from the path, query, headers or cookies
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub source: ParamSource,
    pub kind: ScalarKind,
    pub required: bool,
    /// Value used when an optional parameter is absent
    pub default: Value,
    pub constraints: Constraints,
    pub title: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl ParamSpec {
    fn new(name: &'static str, source: ParamSource, kind: ScalarKind, required: bool) -> Self {
        Self {
            name,
            alias: None,
            source,
            kind,
            required,
            default: Value::Null,
            constraints: Constraints::new(),
            title: None,
            description: None,
        }
    }

    /// Path parameters are always required
    pub fn path(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, ParamSource::Path, kind, true)
    }

    /// Optional query parameter defaulting to `null`
    pub fn query(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, ParamSource::Query, kind, false)
    }

    pub fn header(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, ParamSource::Header, kind, false)
    }

    pub fn cookie(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, ParamSource::Cookie, kind, false)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = value.into();
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    #[must_use]
    pub fn title(mut self, title: &'static str) -> Self {
        self.title = Some(title);
        self
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn constrain(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Name on the wire: the alias when set, headers in `kebab-case`
    pub fn wire_name(&self) -> String {
        match (self.alias, self.source) {
            (Some(alias), _) => alias.to_string(),
            (None, ParamSource::Header) => self.name.replace('_', "-"),
            (None, _) => self.name.to_string(),
        }
    }
}

/// Declared type of a body field
#[derive(Debug, Clone, Copy)]
pub enum BodyKind {
    Model(TypeDescriptor),
    Scalar(ScalarKind),
}

/// A documented request body example
#[derive(Debug, Clone)]
pub struct NamedExample {
    pub name: &'static str,
    pub summary: &'static str,
    pub description: Option<&'static str>,
    pub value: Value,
}

impl NamedExample {
    pub fn new(name: &'static str, summary: &'static str, value: Value) -> Self {
        Self {
            name,
            summary,
            description: None,
            value,
        }
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// One field read from the JSON request body
#[derive(Debug, Clone)]
pub struct BodyField {
    pub name: &'static str,
    pub kind: BodyKind,
    pub required: bool,
    pub constraints: Constraints,
    pub examples: Vec<NamedExample>,
}

impl BodyField {
    /// Required body field holding a model (or a collection of models)
    pub fn model<T: Model>(name: &'static str) -> Self {
        Self {
            name,
            kind: BodyKind::Model(TypeDescriptor::of::<T>()),
            required: true,
            constraints: Constraints::new(),
            examples: Vec::new(),
        }
    }

    /// Required body field holding a scalar
    pub fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self {
            name,
            kind: BodyKind::Scalar(kind),
            required: true,
            constraints: Constraints::new(),
            examples: Vec::new(),
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn constrain(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    #[must_use]
    pub fn example(mut self, example: NamedExample) -> Self {
        self.examples.push(example);
        self
    }
}

/// Handler signature: decoded, validated inputs in, JSON payload out
pub type HandlerFn = fn(&Inputs) -> Result<Value, DispatchError>;

/// A complete route declaration
#[derive(Clone)]
pub struct RouteSpec {
    pub method: Method,
    pub path: &'static str,
    pub operation_id: &'static str,
    pub summary: &'static str,
    pub params: Vec<ParamSpec>,
    pub body: Vec<BodyField>,
    pub handler: HandlerFn,
}

impl RouteSpec {
    pub fn new(
        method: Method,
        path: &'static str,
        operation_id: &'static str,
        handler: HandlerFn,
    ) -> Self {
        Self {
            method,
            path,
            operation_id,
            summary: "",
            params: Vec::new(),
            body: Vec::new(),
            handler,
        }
    }

    #[must_use]
    pub fn summary(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn body(mut self, field: BodyField) -> Self {
        self.body.push(field);
        self
    }

    /// Whether each body field is read from its own key of a JSON object
    pub fn is_embedded(&self) -> bool {
        self.body.len() > 1
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("operation_id", &self.operation_id)
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Decoded and validated values, keyed by declared parameter name
#[derive(Debug, Default)]
pub struct Inputs {
    values: HashMap<&'static str, Value>,
}

impl Inputs {
    pub(super) fn insert(&mut self, name: &'static str, value: Value) {
        self.values.insert(name, value);
    }

    /// The canonical value, `null` when absent
    pub fn get(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(name).unwrap_or(&NULL)
    }

    pub fn int(&self, name: &str) -> Result<i64, DispatchError> {
        self.get(name)
            .as_i64()
            .ok_or_else(|| missing_input(name, "integer"))
    }

    pub fn string(&self, name: &str) -> Result<&str, DispatchError> {
        self.get(name)
            .as_str()
            .ok_or_else(|| missing_input(name, "string"))
    }

    /// `None` when the value is absent, `null` or an empty string
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).as_str().filter(|s| !s.is_empty())
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).as_bool().unwrap_or(false)
    }

    /// Deserialize a canonical value into a typed one
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> Result<T, DispatchError> {
        Ok(serde_json::from_value(self.get(name).clone())?)
    }
}

fn missing_input(name: &str, expected: &str) -> DispatchError {
    DispatchError::Internal(format!("input `{name}` is not a decoded {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        assert_eq!(ParamSpec::header("user_agent", ScalarKind::Str).wire_name(), "user-agent");
        assert_eq!(
            ParamSpec::query("q", ScalarKind::Str).alias("item-query").wire_name(),
            "item-query"
        );
        assert_eq!(ParamSpec::cookie("ads_id", ScalarKind::Str).wire_name(), "ads_id");
    }

    #[test]
    fn test_default_value_makes_optional() {
        let param = ParamSpec::query("short", ScalarKind::Bool).default_value(false);
        assert!(!param.required);
        assert_eq!(param.default, json!(false));
        assert!(ParamSpec::query("q", ScalarKind::Str).required().required);
    }

    #[test]
    fn test_embedding() {
        fn handler(_: &Inputs) -> Result<Value, DispatchError> {
            Ok(Value::Null)
        }
        let single = RouteSpec::new(Method::PUT, "/a", "a", handler)
            .body(BodyField::scalar("n", ScalarKind::Int));
        assert!(!single.is_embedded());
        let pair = single.body(BodyField::scalar("m", ScalarKind::Int));
        assert!(pair.is_embedded());
    }

    #[test]
    fn test_inputs_accessors() {
        let mut inputs = Inputs::default();
        inputs.insert("id", json!(3));
        inputs.insert("q", json!(""));
        inputs.insert("short", json!(true));

        assert_eq!(inputs.int("id").unwrap(), 3);
        assert!(inputs.string("id").is_err());
        assert_eq!(inputs.non_empty("q"), None);
        assert!(inputs.flag("short"));
        assert!(!inputs.flag("absent"));
        assert_eq!(inputs.get("absent"), &Value::Null);
        assert_eq!(inputs.decode::<Option<i64>>("absent").unwrap(), None);
    }
}
