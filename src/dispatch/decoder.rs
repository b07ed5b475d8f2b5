//! Request decoding and validation stages
//!
//! `decode` turns raw request parts into canonical JSON values per declared
//! parameter and reports every type error. `validate` then checks declared
//! constraints on those values and reports every violation.

use hyper::body::Bytes;
use hyper::{HeaderMap, Method};
use serde_json::{json, Map, Value};
use std::borrow::Cow;

use super::spec::{BodyField, BodyKind, Inputs, ParamSource, ParamSpec, RouteSpec};
use crate::http::{parse_cookies, parse_query};
use crate::validation::{ErrorKind, FieldError, FieldErrors, Loc};

/// The parts of an HTTP request the decoder reads
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[cfg(test)]
impl RequestParts {
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .append(name, hyper::header::HeaderValue::from_static(value));
        self
    }

    pub fn json(mut self, body: &Value) -> Self {
        self.body = Bytes::from(body.to_string());
        self
    }

    pub fn raw_body(mut self, body: &'static str) -> Self {
        self.body = Bytes::from_static(body.as_bytes());
        self
    }
}

const OBJECT_EXPECTED: &str = "Input should be a valid dictionary or object to extract fields from";

fn param_loc(param: &ParamSpec) -> Loc {
    Loc::root(param.source.as_str()).key(&param.wire_name())
}

fn body_loc(route: &RouteSpec, field: &BodyField) -> Loc {
    if route.is_embedded() {
        Loc::root("body").key(field.name)
    } else {
        Loc::root("body")
    }
}

/// Decode every declared parameter and body field of `route`
pub fn decode(
    route: &RouteSpec,
    path_params: &[(String, String)],
    parts: &RequestParts,
) -> Result<Inputs, Vec<FieldError>> {
    let mut errors = FieldErrors::new();
    let mut inputs = Inputs::default();
    let query = parse_query(parts.query.as_deref());
    let cookies = parse_cookies(&parts.headers);

    for param in &route.params {
        let wire = param.wire_name();
        let raw: Option<Cow<'_, str>> = match param.source {
            ParamSource::Path => path_params
                .iter()
                .find(|(name, _)| name == param.name)
                .map(|(_, value)| Cow::Borrowed(value.as_str())),
            ParamSource::Query => query.get(&wire).map(|value| Cow::Borrowed(value.as_str())),
            ParamSource::Header => parts
                .headers
                .get(wire.as_str())
                .map(|value| String::from_utf8_lossy(value.as_bytes())),
            ParamSource::Cookie => cookies.get(&wire).map(|value| Cow::Borrowed(value.as_str())),
        };

        let loc = param_loc(param);
        match raw {
            Some(raw) => match param.kind.from_text(&raw, &loc) {
                Ok(value) => inputs.insert(param.name, value),
                Err(e) => errors.push(e),
            },
            None if param.required => errors.missing(loc),
            None => inputs.insert(param.name, param.default.clone()),
        }
    }

    if !route.body.is_empty() {
        decode_body(route, &parts.body, &mut inputs, &mut errors);
    }

    errors.into_result().map(|()| inputs)
}

fn decode_body(route: &RouteSpec, body: &[u8], inputs: &mut Inputs, errors: &mut FieldErrors) {
    let document = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<Value>(body) {
            Ok(document) => Some(document),
            Err(e) => {
                errors.push(json_error(body, &e));
                return;
            }
        }
    };

    if route.is_embedded() {
        let empty = Map::new();
        let object = match &document {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(object)) => object,
            Some(other) => {
                errors.push(FieldError::new(
                    ErrorKind::ModelAttributesType,
                    Loc::root("body"),
                    OBJECT_EXPECTED,
                    other.clone(),
                ));
                return;
            }
        };
        for field in &route.body {
            decode_field(field, object.get(field.name), body_loc(route, field), inputs, errors);
        }
    } else if let Some(field) = route.body.first() {
        decode_field(field, document.as_ref(), Loc::root("body"), inputs, errors);
    }
}

fn decode_field(
    field: &BodyField,
    value: Option<&Value>,
    loc: Loc,
    inputs: &mut Inputs,
    errors: &mut FieldErrors,
) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        if field.required {
            errors.missing(loc);
        } else {
            inputs.insert(field.name, Value::Null);
        }
        return;
    };

    let decoded = match field.kind {
        BodyKind::Model(descriptor) => (descriptor.decode)(value, &loc, errors),
        BodyKind::Scalar(kind) => kind.from_json(value, &loc).map_err(|e| errors.push(e)).ok(),
    };
    if let Some(decoded) = decoded {
        inputs.insert(field.name, decoded);
    }
}

/// `json_invalid` located at the byte offset where parsing stopped
fn json_error(body: &[u8], error: &serde_json::Error) -> FieldError {
    let offset = body
        .split(|b| *b == b'\n')
        .take(error.line().saturating_sub(1))
        .map(|line| line.len() + 1)
        .sum::<usize>()
        + error.column().saturating_sub(1);

    FieldError::new(
        ErrorKind::JsonInvalid,
        Loc::root("body").index(offset),
        "JSON decode error",
        json!({}),
    )
    .with_ctx("error", error.to_string())
}

/// Check declared constraints on decoded inputs
pub fn validate(route: &RouteSpec, inputs: &Inputs) -> Result<(), Vec<FieldError>> {
    let mut errors = FieldErrors::new();

    for param in &route.params {
        param
            .constraints
            .check(inputs.get(param.name), &param_loc(param), &mut errors);
    }

    for field in &route.body {
        let value = inputs.get(field.name);
        if value.is_null() {
            continue;
        }
        let loc = body_loc(route, field);
        match field.kind {
            BodyKind::Model(descriptor) => (descriptor.validate)(value, &loc, &mut errors),
            BodyKind::Scalar(_) => field.constraints.check(value, &loc, &mut errors),
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchError, ParamSpec};
    use crate::models::Item;
    use crate::validation::{Constraints, ScalarKind};

    fn echo(_: &Inputs) -> Result<Value, DispatchError> {
        Ok(Value::Null)
    }

    fn loc_of(error: &FieldError) -> Value {
        serde_json::to_value(&error.loc).unwrap()
    }

    #[test]
    fn test_sources_are_read_by_declaration() {
        let route = RouteSpec::new(Method::GET, "/things/{id}", "things", echo)
            .param(ParamSpec::path("id", ScalarKind::Int))
            .param(ParamSpec::query("q", ScalarKind::Str).alias("item-query"))
            .param(ParamSpec::header("user_agent", ScalarKind::Str))
            .param(ParamSpec::cookie("ads_id", ScalarKind::Str))
            .param(ParamSpec::query("short", ScalarKind::Bool).default_value(false));
        let parts = RequestParts::new(Method::GET, "/things/7?item-query=x&id=99")
            .header("user-agent", "curl/8")
            .header("cookie", "ads_id=abc");

        let inputs = decode(&route, &[("id".to_string(), "7".to_string())], &parts).unwrap();
        assert_eq!(inputs.get("id"), &json!(7));
        assert_eq!(inputs.get("q"), &json!("x"));
        assert_eq!(inputs.get("user_agent"), &json!("curl/8"));
        assert_eq!(inputs.get("ads_id"), &json!("abc"));
        assert_eq!(inputs.get("short"), &json!(false));
    }

    #[test]
    fn test_every_type_error_is_reported() {
        let route = RouteSpec::new(Method::GET, "/things/{id}", "things", echo)
            .param(ParamSpec::path("id", ScalarKind::Int))
            .param(ParamSpec::query("short", ScalarKind::Bool))
            .param(ParamSpec::query("q", ScalarKind::Str).required());
        let parts = RequestParts::new(Method::GET, "/things/x?short=maybe");

        let errors = decode(&route, &[("id".to_string(), "x".to_string())], &parts).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ErrorKind::IntParsing, ErrorKind::BoolParsing, ErrorKind::Missing]
        );
        assert_eq!(loc_of(&errors[2]), json!(["query", "q"]));
    }

    #[test]
    fn test_single_body_field_is_the_document() {
        let route = RouteSpec::new(Method::POST, "/items/", "create", echo)
            .body(BodyField::model::<Item>("item"));

        let parts = RequestParts::new(Method::POST, "/items/").json(&json!({"price": 1}));
        let errors = decode(&route, &[], &parts).unwrap_err();
        assert_eq!(loc_of(&errors[0]), json!(["body", "name"]));

        let parts = RequestParts::new(Method::POST, "/items/");
        let errors = decode(&route, &[], &parts).unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::Missing);
        assert_eq!(loc_of(&errors[0]), json!(["body"]));
    }

    #[test]
    fn test_embedded_fields_are_keyed() {
        let route = RouteSpec::new(Method::PUT, "/a", "a", echo)
            .body(BodyField::model::<Item>("item"))
            .body(BodyField::scalar("importance", ScalarKind::Int));
        let parts = RequestParts::new(Method::PUT, "/a").json(&json!({"importance": "high"}));

        let errors = decode(&route, &[], &parts).unwrap_err();
        assert_eq!(loc_of(&errors[0]), json!(["body", "item"]));
        assert_eq!(errors[0].kind, ErrorKind::Missing);
        assert_eq!(loc_of(&errors[1]), json!(["body", "importance"]));
        assert_eq!(errors[1].kind, ErrorKind::IntParsing);
    }

    #[test]
    fn test_optional_embedded_fields_default_to_null() {
        let route = RouteSpec::new(Method::PUT, "/a", "a", echo)
            .body(BodyField::scalar("start", ScalarKind::DateTime).optional())
            .body(BodyField::scalar("after", ScalarKind::Duration).optional());
        let inputs = decode(&route, &[], &RequestParts::new(Method::PUT, "/a")).unwrap();
        assert_eq!(inputs.get("start"), &Value::Null);
        assert_eq!(inputs.get("after"), &Value::Null);
    }

    #[test]
    fn test_invalid_json_reports_offset() {
        let route = RouteSpec::new(Method::POST, "/items/", "create", echo)
            .body(BodyField::model::<Item>("item"));
        let parts = RequestParts::new(Method::POST, "/items/").raw_body("{\"name\": }");

        let errors = decode(&route, &[], &parts).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::JsonInvalid);
        assert_eq!(loc_of(&errors[0]), json!(["body", 9]));
        assert!(errors[0].ctx.as_ref().unwrap().contains_key("error"));
    }

    #[test]
    fn test_embedded_body_must_be_object() {
        let route = RouteSpec::new(Method::PUT, "/a", "a", echo)
            .body(BodyField::scalar("n", ScalarKind::Int))
            .body(BodyField::scalar("m", ScalarKind::Int));
        let parts = RequestParts::new(Method::PUT, "/a").json(&json!([1]));
        let errors = decode(&route, &[], &parts).unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::ModelAttributesType);
    }

    #[test]
    fn test_validate_reports_every_violation() {
        let route = RouteSpec::new(Method::PUT, "/a/{id}", "a", echo)
            .param(ParamSpec::path("id", ScalarKind::Int).constrain(Constraints::new().ge(1.0)))
            .body(BodyField::model::<Item>("item"))
            .body(
                BodyField::scalar("importance", ScalarKind::Int)
                    .constrain(Constraints::new().gt(0.0)),
            );
        let parts = RequestParts::new(Method::PUT, "/a/0").json(&json!({
            "item": {"name": "x", "price": -1},
            "importance": 0
        }));

        let inputs = decode(&route, &[("id".to_string(), "0".to_string())], &parts).unwrap();
        let errors = validate(&route, &inputs).unwrap_err();
        let locs: Vec<_> = errors.iter().map(loc_of).collect();
        assert_eq!(
            locs,
            vec![
                json!(["path", "id"]),
                json!(["body", "item", "price"]),
                json!(["body", "importance"])
            ]
        );
    }

    #[test]
    fn test_absent_optional_values_are_not_constrained() {
        let route = RouteSpec::new(Method::GET, "/a", "a", echo).param(
            ParamSpec::query("q", ScalarKind::Str).constrain(Constraints::new().min_length(3)),
        );
        let inputs = decode(&route, &[], &RequestParts::new(Method::GET, "/a")).unwrap();
        assert!(validate(&route, &inputs).is_ok());
    }
}
