use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::openapi::{self, RefOr};
use utoipa::ToSchema;

use super::{component_ref, Decode, Fields, Item, Schema, Validate};
use crate::validation::{FieldErrors, Loc};

/// A bundle of items sold together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Offer {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub items: Vec<Item>,
}

impl Decode for Offer {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        let fields = Fields::open(value, loc, errors)?;
        let name = fields.required("name", errors);
        let description = fields.optional("description", errors);
        let price = fields.required("price", errors);
        let items = fields.required("items", errors);
        Some(Self {
            name: name?,
            description: description?,
            price: price?,
            items: items?,
        })
    }
}

impl Validate for Offer {
    fn validate(&self, loc: &Loc, errors: &mut FieldErrors) {
        self.items.validate(&loc.key("items"), errors);
    }
}

impl Schema for Offer {
    fn schema_ref() -> RefOr<openapi::Schema> {
        component_ref::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_empty_item_list_is_accepted() {
        let mut errors = FieldErrors::new();
        let offer = Offer::decode(
            &json!({"name": "Deal", "price": 10, "items": []}),
            &Loc::root("body"),
            &mut errors,
        )
        .unwrap();
        assert!(offer.items.is_empty());
        assert_eq!(offer.description, None);
    }

    #[test]
    fn test_nested_item_constraint_is_reported() {
        let loc = Loc::root("body");
        let mut errors = FieldErrors::new();
        let offer = Offer::decode(
            &json!({
                "name": "Deal",
                "price": 10,
                "items": [{"name": "a", "price": 1}, {"name": "b", "price": -1}]
            }),
            &loc,
            &mut errors,
        )
        .unwrap();
        offer.validate(&loc, &mut errors);

        let errors = errors.into_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::GreaterThan);
        assert_eq!(
            serde_json::to_value(&errors[0].loc).unwrap(),
            json!(["body", "items", 1, "price"])
        );
    }

    #[test]
    fn test_schema_references_items() {
        let schema = serde_json::to_value(<Offer as utoipa::PartialSchema>::schema()).unwrap();
        assert_eq!(
            schema["properties"]["items"]["items"]["$ref"],
            "#/components/schemas/Item"
        );
    }

    #[test]
    fn test_round_trip_through_decoder() {
        let loc = Loc::root("body");
        let mut errors = FieldErrors::new();
        let item = Item::decode(&Item::example(), &loc, &mut errors).unwrap();
        let offer = Offer {
            name: "Deal".to_string(),
            description: Some("two for one".to_string()),
            price: 9.5,
            items: vec![item.clone(), item],
        };

        let encoded = serde_json::to_value(&offer).unwrap();
        let decoded = Offer::decode(&encoded, &loc, &mut errors).unwrap();
        decoded.validate(&loc, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(decoded, offer);
    }
}
