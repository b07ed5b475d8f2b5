//! Structured records exchanged in request and response bodies
//!
//! A model decodes in two passes. `Decode` checks shapes and types and
//! collects every type error; `Validate` then checks field constraints on the
//! typed value. Records derive `utoipa::ToSchema` for the OpenAPI document.

mod image;
mod item;
mod offer;
mod user;

pub use image::Image;
pub use item::Item;
pub use offer::Offer;
pub use user::User;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use utoipa::openapi::schema::{ArrayBuilder, ObjectBuilder, Type};
use utoipa::openapi::{self, Ref, RefOr};
use utoipa::ToSchema;

use crate::validation::{
    json_to_f64, json_to_i64, json_to_string, text_to_i64, ErrorKind, FieldError, FieldErrors,
    Loc,
};

/// Shape and type decoding from a JSON value
pub trait Decode: Sized {
    /// Decode `value`, pushing every type error found under `loc`.
    /// Returns `None` when at least one error was pushed.
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self>;
}

/// Constraint checks on an already-typed value
pub trait Validate {
    fn validate(&self, _loc: &Loc, _errors: &mut FieldErrors) {}
}

/// OpenAPI schema used where a route names this type
pub trait Schema {
    fn schema_ref() -> RefOr<openapi::Schema>;
}

/// `$ref` to a component registered from a derived `ToSchema`
pub fn component_ref<T: ToSchema>() -> RefOr<openapi::Schema> {
    RefOr::Ref(Ref::from_schema_name(T::name()))
}

/// A body type the dispatcher can decode, validate and describe
pub trait Model: Decode + Validate + Schema + Serialize + DeserializeOwned {}

impl<T> Model for T where T: Decode + Validate + Schema + Serialize + DeserializeOwned {}

/// Type-erased entry points for one `Model`, stored in route declarations
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    pub decode: fn(&Value, &Loc, &mut FieldErrors) -> Option<Value>,
    pub validate: fn(&Value, &Loc, &mut FieldErrors),
    pub schema: fn() -> RefOr<openapi::Schema>,
}

impl TypeDescriptor {
    pub fn of<T: Model>() -> Self {
        Self {
            decode: decode_erased::<T>,
            validate: validate_erased::<T>,
            schema: T::schema_ref,
        }
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor").finish_non_exhaustive()
    }
}

fn decode_erased<T: Model>(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Value> {
    let typed = T::decode(value, loc, errors)?;
    match serde_json::to_value(typed) {
        Ok(canonical) => Some(canonical),
        Err(e) => {
            errors.push(FieldError::new(
                ErrorKind::ValueError,
                loc.clone(),
                format!("Value error, {e}"),
                value.clone(),
            ));
            None
        }
    }
}

fn validate_erased<T: Model>(value: &Value, loc: &Loc, errors: &mut FieldErrors) {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(typed) => typed.validate(loc, errors),
        Err(e) => errors.push(FieldError::new(
            ErrorKind::ValueError,
            loc.clone(),
            format!("Value error, {e}"),
            value.clone(),
        )),
    }
}

/// Field access over a JSON object with error collection
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
    loc: &'a Loc,
}

impl<'a> Fields<'a> {
    /// Open `value` as an object; pushes `model_attributes_type` otherwise
    pub fn open(value: &'a Value, loc: &'a Loc, errors: &mut FieldErrors) -> Option<Self> {
        if let Value::Object(object) = value {
            Some(Self { object, loc })
        } else {
            errors.push(FieldError::new(
                ErrorKind::ModelAttributesType,
                loc.clone(),
                "Input should be a valid dictionary or object to extract fields from",
                value.clone(),
            ));
            None
        }
    }

    /// A field that must be present
    pub fn required<T: Decode>(&self, name: &str, errors: &mut FieldErrors) -> Option<T> {
        let loc = self.loc.key(name);
        match self.object.get(name) {
            Some(value) => T::decode(value, &loc, errors),
            None => {
                errors.missing(loc);
                None
            }
        }
    }

    /// A field that may be absent or `null`.
    /// The outer `Option` is decode success, the inner one is presence.
    pub fn optional<T: Decode>(&self, name: &str, errors: &mut FieldErrors) -> Option<Option<T>> {
        match self.object.get(name) {
            None | Some(Value::Null) => Some(None),
            Some(value) => T::decode(value, &self.loc.key(name), errors).map(Some),
        }
    }

    /// A field that falls back to `T::default()` when absent
    pub fn or_default<T: Decode + Default>(
        &self,
        name: &str,
        errors: &mut FieldErrors,
    ) -> Option<T> {
        match self.object.get(name) {
            None => Some(T::default()),
            Some(value) => T::decode(value, &self.loc.key(name), errors),
        }
    }
}

fn collect<T>(result: Result<T, FieldError>, errors: &mut FieldErrors) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

impl Decode for String {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        collect(json_to_string(value, loc), errors)
    }
}

impl Decode for f64 {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        collect(json_to_f64(value, loc), errors)
    }
}

impl Decode for i64 {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        collect(json_to_i64(value, loc), errors)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        let Value::Array(elements) = value else {
            errors.push(FieldError::new(
                ErrorKind::ListType,
                loc.clone(),
                "Input should be a valid list",
                value.clone(),
            ));
            return None;
        };

        let decoded: Vec<Option<T>> = elements
            .iter()
            .enumerate()
            .map(|(i, element)| T::decode(element, &loc.index(i), errors))
            .collect();
        decoded.into_iter().collect()
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        Vec::<T>::decode(value, loc, errors).map(|items| items.into_iter().collect())
    }
}

/// Object keys are text, so integer keys are parsed from the key string
impl<V: Decode> Decode for BTreeMap<i64, V> {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        let Value::Object(object) = value else {
            errors.push(FieldError::new(
                ErrorKind::DictType,
                loc.clone(),
                "Input should be a valid dictionary",
                value.clone(),
            ));
            return None;
        };

        let mut out = Self::new();
        let mut failed = false;
        for (raw_key, raw_value) in object {
            let entry_loc = loc.key(raw_key);
            let key = collect(text_to_i64(raw_key, &entry_loc.key("[key]")), errors);
            let value = V::decode(raw_value, &entry_loc, errors);
            match (key, value) {
                (Some(key), Some(value)) => {
                    out.insert(key, value);
                }
                _ => failed = true,
            }
        }
        (!failed).then_some(out)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, loc: &Loc, errors: &mut FieldErrors) {
        for (i, element) in self.iter().enumerate() {
            element.validate(&loc.index(i), errors);
        }
    }
}

impl<V> Validate for BTreeMap<i64, V> {}

impl<T: Schema> Schema for Vec<T> {
    fn schema_ref() -> RefOr<openapi::Schema> {
        RefOr::T(openapi::Schema::Array(
            ArrayBuilder::new().items(T::schema_ref()).build(),
        ))
    }
}

/// Integer keys travel as object keys, so only the values are typed
impl Schema for BTreeMap<i64, f64> {
    fn schema_ref() -> RefOr<openapi::Schema> {
        RefOr::T(openapi::Schema::Object(
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .additional_properties(Some(ObjectBuilder::new().schema_type(Type::Number)))
                .build(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vec_collects_every_element_error() {
        let mut errors = FieldErrors::new();
        let decoded = Vec::<i64>::decode(&json!([1, "x", 3.5]), &Loc::root("body"), &mut errors);
        assert!(decoded.is_none());

        let errors = errors.into_vec();
        assert_eq!(errors.len(), 2);
        assert_eq!(serde_json::to_value(&errors[0].loc).unwrap(), json!(["body", 1]));
        assert_eq!(errors[1].kind, ErrorKind::IntFromFloat);
    }

    #[test]
    fn test_set_deduplicates() {
        let mut errors = FieldErrors::new();
        let tags = BTreeSet::<String>::decode(&json!(["b", "a", "b"]), &Loc::root("body"), &mut errors)
            .unwrap();
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_int_keyed_map() {
        let mut errors = FieldErrors::new();
        let weights = BTreeMap::<i64, f64>::decode(
            &json!({"2": 0.5, "-1": "1.5"}),
            &Loc::root("body"),
            &mut errors,
        )
        .unwrap();
        assert_eq!(weights.get(&2), Some(&0.5));
        assert_eq!(weights.get(&-1), Some(&1.5));
    }

    #[test]
    fn test_int_keyed_map_reports_bad_key() {
        let mut errors = FieldErrors::new();
        let decoded = BTreeMap::<i64, f64>::decode(
            &json!({"foo": 1.0}),
            &Loc::root("body"),
            &mut errors,
        );
        assert!(decoded.is_none());
        let errors = errors.into_vec();
        assert_eq!(errors[0].kind, ErrorKind::IntParsing);
        assert_eq!(
            serde_json::to_value(&errors[0].loc).unwrap(),
            json!(["body", "foo", "[key]"])
        );
    }

    #[test]
    fn test_map_rejects_non_object() {
        let mut errors = FieldErrors::new();
        assert!(BTreeMap::<i64, f64>::decode(&json!([1]), &Loc::root("body"), &mut errors).is_none());
        assert_eq!(errors.into_vec()[0].kind, ErrorKind::DictType);
    }

    #[test]
    fn test_fields_optional_treats_null_as_absent() {
        let value = json!({"a": null, "b": "x"});
        let loc = Loc::root("body");
        let mut errors = FieldErrors::new();
        let fields = Fields::open(&value, &loc, &mut errors).unwrap();
        assert_eq!(fields.optional::<String>("a", &mut errors), Some(None));
        assert_eq!(fields.optional::<String>("b", &mut errors), Some(Some("x".to_string())));
        assert_eq!(fields.optional::<String>("c", &mut errors), Some(None));
        assert!(fields.required::<String>("c", &mut errors).is_none());
        assert_eq!(errors.into_vec()[0].kind, ErrorKind::Missing);
    }

    #[test]
    fn test_collection_schemas() {
        let images = serde_json::to_value(Vec::<Image>::schema_ref()).unwrap();
        assert_eq!(images["type"], "array");
        assert_eq!(images["items"]["$ref"], "#/components/schemas/Image");

        let weights = serde_json::to_value(BTreeMap::<i64, f64>::schema_ref()).unwrap();
        assert_eq!(weights["type"], "object");
        assert_eq!(weights["additionalProperties"]["type"], "number");
    }
}
