//! Declared per-field constraints: numeric bounds, string length, pattern

use regex::Regex;
use serde_json::Value;
use utoipa::openapi::schema::ObjectBuilder;

use super::error::{number_text, number_value, ErrorKind, FieldError, FieldErrors, Loc};

/// Constraint set attached to a parameter or model field.
///
/// Bounds follow the operator they are declared with: `gt`/`lt` are
/// exclusive, `ge`/`le` inclusive. Lengths count characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    gt: Option<f64>,
    ge: Option<f64>,
    lt: Option<f64>,
    le: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    #[must_use]
    pub fn ge(mut self, bound: f64) -> Self {
        self.ge = Some(bound);
        self
    }

    // No route declares an upper exclusive bound or a pattern yet
    #[allow(dead_code)]
    #[must_use]
    pub fn lt(mut self, bound: f64) -> Self {
        self.lt = Some(bound);
        self
    }

    #[must_use]
    pub fn le(mut self, bound: f64) -> Self {
        self.le = Some(bound);
        self
    }

    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    #[allow(dead_code)]
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Check an already-coerced JSON value. `null` is never constrained.
    pub fn check(&self, value: &Value, loc: &Loc, errors: &mut FieldErrors) {
        match value {
            Value::Number(n) => {
                if let Some(n) = n.as_f64() {
                    self.check_number(n, value, loc, errors);
                }
            }
            Value::String(s) => self.check_str(s, loc, errors),
            _ => {}
        }
    }

    pub fn check_number(&self, n: f64, input: &Value, loc: &Loc, errors: &mut FieldErrors) {
        let rules = [
            (self.gt, ErrorKind::GreaterThan, "gt", "greater than"),
            (self.ge, ErrorKind::GreaterThanEqual, "ge", "greater than or equal to"),
            (self.lt, ErrorKind::LessThan, "lt", "less than"),
            (self.le, ErrorKind::LessThanEqual, "le", "less than or equal to"),
        ];

        for (bound, kind, key, phrase) in rules {
            let Some(bound) = bound else { continue };
            let holds = match kind {
                ErrorKind::GreaterThan => n > bound,
                ErrorKind::GreaterThanEqual => n >= bound,
                ErrorKind::LessThan => n < bound,
                _ => n <= bound,
            };
            if !holds {
                errors.push(
                    FieldError::new(
                        kind,
                        loc.clone(),
                        format!("Input should be {phrase} {}", number_text(bound)),
                        input.clone(),
                    )
                    .with_ctx(key, number_value(bound)),
                );
            }
        }
    }

    pub fn check_str(&self, s: &str, loc: &Loc, errors: &mut FieldErrors) {
        let len = s.chars().count();

        if let Some(min) = self.min_length.filter(|min| len < *min) {
            errors.push(
                FieldError::new(
                    ErrorKind::StringTooShort,
                    loc.clone(),
                    format!("String should have at least {min} {}", plural(min)),
                    Value::from(s),
                )
                .with_ctx("min_length", min),
            );
        }

        if let Some(max) = self.max_length.filter(|max| len > *max) {
            errors.push(
                FieldError::new(
                    ErrorKind::StringTooLong,
                    loc.clone(),
                    format!("String should have at most {max} {}", plural(max)),
                    Value::from(s),
                )
                .with_ctx("max_length", max),
            );
        }

        if let Some(pattern) = self.pattern.as_ref().filter(|re| !re.is_match(s)) {
            errors.push(
                FieldError::new(
                    ErrorKind::StringPatternMismatch,
                    loc.clone(),
                    format!("String should match pattern '{}'", pattern.as_str()),
                    Value::from(s),
                )
                .with_ctx("pattern", pattern.as_str()),
            );
        }
    }

    /// Add the schema keywords for these constraints to `schema`
    pub fn describe(&self, schema: ObjectBuilder) -> ObjectBuilder {
        schema
            .exclusive_minimum(self.gt)
            .minimum(self.ge)
            .exclusive_maximum(self.lt)
            .maximum(self.le)
            .min_length(self.min_length)
            .max_length(self.max_length)
            .pattern(self.pattern.as_ref().map(Regex::as_str))
    }
}

const fn plural(n: usize) -> &'static str {
    if n == 1 {
        "character"
    } else {
        "characters"
    }
}
