use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use utoipa::openapi::{self, RefOr};
use utoipa::ToSchema;

use super::{component_ref, Decode, Fields, Schema, Validate};
use crate::validation::{ErrorKind, FieldError, FieldErrors, Loc};

/// Picture attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Image {
    pub url: Url,
    pub name: String,
}

impl Decode for Image {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        let fields = Fields::open(value, loc, errors)?;
        let url = fields.required::<Url>("url", errors);
        let name = fields.required::<String>("name", errors);
        Some(Self {
            url: url?,
            name: name?,
        })
    }
}

impl Validate for Image {}

impl Schema for Image {
    fn schema_ref() -> RefOr<openapi::Schema> {
        component_ref::<Self>()
    }
}

/// Absolute `http`/`https` URL with a host
impl Decode for Url {
    fn decode(value: &Value, loc: &Loc, errors: &mut FieldErrors) -> Option<Self> {
        let Some(raw) = value.as_str() else {
            errors.push(FieldError::new(
                ErrorKind::UrlType,
                loc.clone(),
                "URL input should be a string or URL",
                value.clone(),
            ));
            return None;
        };

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                errors.push(
                    FieldError::new(
                        ErrorKind::UrlParsing,
                        loc.clone(),
                        format!("Input should be a valid URL, {e}"),
                        value.clone(),
                    )
                    .with_ctx("error", e.to_string()),
                );
                return None;
            }
        };

        if !matches!(url.scheme(), "http" | "https") {
            errors.push(
                FieldError::new(
                    ErrorKind::UrlScheme,
                    loc.clone(),
                    "URL scheme should be 'http' or 'https'",
                    value.clone(),
                )
                .with_ctx("expected_schemes", "'http' or 'https'"),
            );
            return None;
        }

        if url.host_str().is_none_or(str::is_empty) {
            errors.push(FieldError::new(
                ErrorKind::UrlParsing,
                loc.clone(),
                "Input should be a valid URL, empty host",
                value.clone(),
            ));
            return None;
        }

        Some(url)
    }
}
