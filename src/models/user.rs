use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::openapi::{self, RefOr};
use utoipa::ToSchema;

use super::{component_ref, Decode, Fields, Schema, Validate};
use crate::validation::{FieldErrors, Loc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub username: String,
    pub full_name: Option<String>,
}

impl Decode for User {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        let fields = Fields::open(value, loc, errors)?;
        let username = fields.required("username", errors);
        let full_name = fields.optional("full_name", errors);
        Some(Self {
            username: username?,
            full_name: full_name?,
        })
    }
}

impl Validate for User {}

impl Schema for User {
    fn schema_ref() -> RefOr<openapi::Schema> {
        component_ref::<Self>()
    }
}
