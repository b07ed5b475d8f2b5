use hyper::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::validation::FieldError;

/// Request pipeline failures, each mapped to one response status
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed { allowed: Vec<Method> },

    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Payload Too Large (limit {limit} bytes)")]
    PayloadTooLarge { limit: u64 },

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Value of the `detail` key in the error body.
    /// Internal error text stays in the log, never in the response.
    pub fn detail(&self) -> Value {
        match self {
            Self::Validation(errors) => serde_json::to_value(errors)
                .unwrap_or_else(|_| Value::from("Unprocessable Entity")),
            Self::NotFound => Value::from("Not Found"),
            Self::MethodNotAllowed { .. } => Value::from("Method Not Allowed"),
            Self::PayloadTooLarge { .. } => Value::from("Payload Too Large"),
            Self::BadRequest(_) => Value::from("Bad Request"),
            Self::Internal(_) => Value::from("Internal Server Error"),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<Vec<FieldError>> for DispatchError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Loc;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DispatchError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            DispatchError::Validation(vec![]).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DispatchError::PayloadTooLarge { limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_validation_detail_lists_errors() {
        let err = DispatchError::Validation(vec![FieldError::missing(Loc::root("query").key("q"))]);
        assert_eq!(
            err.detail(),
            json!([{"type": "missing", "loc": ["query", "q"], "msg": "Field required", "input": null}])
        );
    }

    #[test]
    fn test_internal_detail_hides_cause() {
        let err = DispatchError::Internal("secret".to_string());
        assert_eq!(err.detail(), json!("Internal Server Error"));
        assert!(err.to_string().contains("secret"));
    }
}
