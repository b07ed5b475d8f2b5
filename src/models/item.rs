use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use utoipa::openapi::{self, RefOr};
use utoipa::ToSchema;

use super::{component_ref, Decode, Fields, Image, Schema, Validate};
use crate::validation::{Constraints, FieldErrors, Loc};

pub const DESCRIPTION_MAX_CHARS: usize = 300;

/// Catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(examples(json!({
    "name": "Foo",
    "description": "A very nice Item",
    "price": 35.4,
    "tax": 3.2,
    "tags": ["first_tag", "second_tag"],
    "images": [
        { "url": "https://example.com/", "name": "img_name" }
    ]
})))]
pub struct Item {
    pub name: String,
    /// The description of the item
    #[schema(max_length = 300)]
    pub description: Option<String>,
    /// Price must be greater than zero
    #[schema(exclusive_minimum = 0)]
    pub price: f64,
    pub tax: Option<f64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub images: Option<Vec<Image>>,
}

impl Item {
    /// `price + tax` whenever a tax is present, a zero tax included
    pub fn price_with_tax(&self) -> Option<f64> {
        self.tax.map(|tax| self.price + tax)
    }

    /// The payload published as the schema example
    #[cfg(test)]
    pub fn example() -> Value {
        serde_json::json!({
            "name": "Foo",
            "description": "A very nice Item",
            "price": 35.4,
            "tax": 3.2,
            "tags": ["first_tag", "second_tag"],
            "images": [
                { "url": "https://example.com/", "name": "img_name" }
            ]
        })
    }
}

impl Decode for Item {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        let fields = Fields::open(value, loc, errors)?;
        let name = fields.required("name", errors);
        let description = fields.optional("description", errors);
        let price = fields.required("price", errors);
        let tax = fields.optional("tax", errors);
        let tags = fields.or_default("tags", errors);
        let images = fields.optional("images", errors);
        Some(Self {
            name: name?,
            description: description?,
            price: price?,
            tax: tax?,
            tags: tags?,
            images: images?,
        })
    }
}

impl Validate for Item {
    fn validate(&self, loc: &Loc, errors: &mut FieldErrors) {
        if let Some(description) = &self.description {
            Constraints::new()
                .max_length(DESCRIPTION_MAX_CHARS)
                .check_str(description, &loc.key("description"), errors);
        }

        Constraints::new()
            .gt(0.0)
            .check_number(self.price, &Value::from(self.price), &loc.key("price"), errors);

        if let Some(images) = &self.images {
            images.validate(&loc.key("images"), errors);
        }
    }
}

impl Schema for Item {
    fn schema_ref() -> RefOr<openapi::Schema> {
        component_ref::<Self>()
    }
}
