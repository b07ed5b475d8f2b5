//! Scalar coercion from request text and JSON
//!
//! Text comes from path segments, query strings, headers and cookies. JSON
//! comes from request bodies. Both produce the same canonical JSON value so
//! later stages never need to know where a value came from.

use serde_json::Value;
use utoipa::openapi::schema::{ObjectBuilder, SchemaFormat, Type};
use uuid::Uuid;

use super::error::{ErrorKind, FieldError, Loc};
use super::temporal::{self, Timestamp};

const TRUE_WORDS: [&str; 6] = ["true", "1", "on", "yes", "t", "y"];
const FALSE_WORDS: [&str; 6] = ["false", "0", "off", "no", "f", "n"];

/// Declared type of a scalar parameter or body field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Str,
    Bool,
    Uuid,
    DateTime,
    Time,
    Duration,
    /// One of a fixed set of string members, compared case-sensitively
    Choice(&'static [&'static str]),
}

impl ScalarKind {
    /// Coerce raw request text into the canonical JSON value
    pub fn from_text(self, raw: &str, loc: &Loc) -> Result<Value, FieldError> {
        match self {
            Self::Int => text_to_i64(raw, loc).map(Value::from),
            Self::Str => Ok(Value::from(raw)),
            Self::Bool => text_to_bool(raw, loc).map(Value::from),
            Self::Uuid => text_to_uuid(raw, loc),
            Self::DateTime => text_to_datetime(raw, loc),
            Self::Time => text_to_time(raw, loc),
            Self::Duration => text_to_duration(raw, loc),
            Self::Choice(members) => choice(raw, members, loc),
        }
    }

    /// Coerce a decoded JSON body value into the canonical JSON value
    pub fn from_json(self, raw: &Value, loc: &Loc) -> Result<Value, FieldError> {
        match self {
            Self::Int => json_to_i64(raw, loc).map(Value::from),
            Self::Str => json_to_string(raw, loc).map(Value::from),
            Self::Bool => json_to_bool(raw, loc).map(Value::from),
            Self::Uuid => as_text(raw, ErrorKind::UuidParsing, "UUID input should be a string", loc)
                .and_then(|text| text_to_uuid(text, loc)),
            Self::DateTime => match raw {
                Value::Number(n) => n
                    .as_f64()
                    .and_then(Timestamp::from_unix)
                    .map(|ts| Value::from(ts.to_string()))
                    .ok_or_else(|| datetime_error(raw.clone(), loc)),
                Value::String(text) => text_to_datetime(text, loc),
                other => Err(datetime_error(other.clone(), loc)),
            },
            Self::Time => as_text(raw, ErrorKind::TimeParsing, "Input should be a valid time", loc)
                .and_then(|text| text_to_time(text, loc)),
            Self::Duration => match raw {
                Value::Number(n) => n
                    .as_f64()
                    .and_then(temporal::seconds_to_delta)
                    .map(|delta| Value::from(temporal::format_duration(delta)))
                    .ok_or_else(|| duration_error(raw.clone(), loc)),
                Value::String(text) => text_to_duration(text, loc),
                other => Err(duration_error(other.clone(), loc)),
            },
            Self::Choice(members) => match raw {
                Value::String(text) => choice(text, members, loc),
                other => Err(enum_error(other.clone(), members, loc)),
            },
        }
    }

    /// OpenAPI schema describing this kind, ready for constraints
    pub fn schema(self) -> ObjectBuilder {
        let format = |name: &str| Some(SchemaFormat::Custom(name.to_string()));
        match self {
            Self::Int => ObjectBuilder::new().schema_type(Type::Integer),
            Self::Str => ObjectBuilder::new().schema_type(Type::String),
            Self::Bool => ObjectBuilder::new().schema_type(Type::Boolean),
            Self::Uuid => ObjectBuilder::new().schema_type(Type::String).format(format("uuid")),
            Self::DateTime => ObjectBuilder::new()
                .schema_type(Type::String)
                .format(format("date-time")),
            Self::Time => ObjectBuilder::new().schema_type(Type::String).format(format("time")),
            Self::Duration => ObjectBuilder::new()
                .schema_type(Type::String)
                .format(format("duration")),
            Self::Choice(members) => ObjectBuilder::new()
                .schema_type(Type::String)
                .enum_values(Some(members.iter().copied())),
        }
    }
}

pub fn text_to_i64(raw: &str, loc: &Loc) -> Result<i64, FieldError> {
    raw.parse::<i64>().map_err(|_| {
        FieldError::new(
            ErrorKind::IntParsing,
            loc.clone(),
            "Input should be a valid integer, unable to parse string as an integer",
            Value::from(raw),
        )
    })
}

pub fn text_to_f64(raw: &str, loc: &Loc) -> Result<f64, FieldError> {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(FieldError::new(
            ErrorKind::FloatParsing,
            loc.clone(),
            "Input should be a valid number, unable to parse string as a number",
            Value::from(raw),
        )),
    }
}

pub fn text_to_bool(raw: &str, loc: &Loc) -> Result<bool, FieldError> {
    let lowered = raw.to_ascii_lowercase();
    if TRUE_WORDS.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSE_WORDS.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(FieldError::new(
            ErrorKind::BoolParsing,
            loc.clone(),
            "Input should be a valid boolean, unable to interpret input",
            Value::from(raw),
        ))
    }
}

/// Integers accept JSON integers, whole floats and integer strings
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn json_to_i64(raw: &Value, loc: &Loc) -> Result<i64, FieldError> {
    match raw {
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                return Ok(int);
            }
            match n.as_f64() {
                Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                    Ok(float as i64)
                }
                Some(float) if float.fract() != 0.0 => Err(FieldError::new(
                    ErrorKind::IntFromFloat,
                    loc.clone(),
                    "Input should be a valid integer, got a number with a fractional part",
                    raw.clone(),
                )),
                _ => Err(FieldError::new(
                    ErrorKind::IntParsing,
                    loc.clone(),
                    "Input should be a valid integer, unable to parse number as an integer",
                    raw.clone(),
                )),
            }
        }
        Value::String(text) => text_to_i64(text, loc),
        other => Err(FieldError::new(
            ErrorKind::IntType,
            loc.clone(),
            "Input should be a valid integer",
            other.clone(),
        )),
    }
}

/// Floats accept JSON numbers and numeric strings
pub fn json_to_f64(raw: &Value, loc: &Loc) -> Result<f64, FieldError> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            FieldError::new(
                ErrorKind::FloatParsing,
                loc.clone(),
                "Input should be a valid number",
                raw.clone(),
            )
        }),
        Value::String(text) => text_to_f64(text, loc),
        other => Err(FieldError::new(
            ErrorKind::FloatType,
            loc.clone(),
            "Input should be a valid number",
            other.clone(),
        )),
    }
}

/// Strings are strict: numbers and booleans are not silently stringified
pub fn json_to_string(raw: &Value, loc: &Loc) -> Result<String, FieldError> {
    match raw {
        Value::String(text) => Ok(text.clone()),
        other => Err(FieldError::new(
            ErrorKind::StringType,
            loc.clone(),
            "Input should be a valid string",
            other.clone(),
        )),
    }
}

pub fn json_to_bool(raw: &Value, loc: &Loc) -> Result<bool, FieldError> {
    match raw {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => text_to_bool(text, loc),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        other => Err(FieldError::new(
            ErrorKind::BoolType,
            loc.clone(),
            "Input should be a valid boolean",
            other.clone(),
        )),
    }
}

fn as_text<'a>(
    raw: &'a Value,
    kind: ErrorKind,
    msg: &str,
    loc: &Loc,
) -> Result<&'a str, FieldError> {
    raw.as_str()
        .ok_or_else(|| FieldError::new(kind, loc.clone(), msg, raw.clone()))
}

fn text_to_uuid(raw: &str, loc: &Loc) -> Result<Value, FieldError> {
    Uuid::parse_str(raw)
        .map(|id| Value::from(id.hyphenated().to_string()))
        .map_err(|e| {
            FieldError::new(
                ErrorKind::UuidParsing,
                loc.clone(),
                format!("Input should be a valid UUID, {e}"),
                Value::from(raw),
            )
        })
}

fn text_to_datetime(raw: &str, loc: &Loc) -> Result<Value, FieldError> {
    Timestamp::parse(raw)
        .map(|ts| Value::from(ts.to_string()))
        .ok_or_else(|| datetime_error(Value::from(raw), loc))
}

fn text_to_time(raw: &str, loc: &Loc) -> Result<Value, FieldError> {
    temporal::parse_time(raw)
        .map(|time| Value::from(time.to_string()))
        .ok_or_else(|| {
            FieldError::new(
                ErrorKind::TimeParsing,
                loc.clone(),
                "Input should be in a valid time format",
                Value::from(raw),
            )
        })
}

fn text_to_duration(raw: &str, loc: &Loc) -> Result<Value, FieldError> {
    temporal::parse_duration(raw)
        .map(|delta| Value::from(temporal::format_duration(delta)))
        .ok_or_else(|| duration_error(Value::from(raw), loc))
}

fn datetime_error(input: Value, loc: &Loc) -> FieldError {
    FieldError::new(
        ErrorKind::DatetimeParsing,
        loc.clone(),
        "Input should be a valid datetime",
        input,
    )
}

fn duration_error(input: Value, loc: &Loc) -> FieldError {
    FieldError::new(
        ErrorKind::TimeDeltaParsing,
        loc.clone(),
        "Input should be a valid duration",
        input,
    )
}

fn choice(raw: &str, members: &[&str], loc: &Loc) -> Result<Value, FieldError> {
    if members.contains(&raw) {
        Ok(Value::from(raw))
    } else {
        Err(enum_error(Value::from(raw), members, loc))
    }
}

fn enum_error(input: Value, members: &[&str], loc: &Loc) -> FieldError {
    let expected = expected_members(members);
    FieldError::new(
        ErrorKind::Enum,
        loc.clone(),
        format!("Input should be {expected}"),
        input,
    )
    .with_ctx("expected", expected)
}

/// `'a', 'b' or 'c'`
fn expected_members(members: &[&str]) -> String {
    let quoted: Vec<String> = members.iter().map(|m| format!("'{m}'")).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {last}", rest.join(", ")),
        Some((only, _)) => only.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MODELS: &[&str] = &["alexnet", "resnet", "lenet"];

    fn loc() -> Loc {
        Loc::root("path").key("v")
    }

    #[test]
    fn test_int_from_text() {
        assert_eq!(ScalarKind::Int.from_text("42", &loc()).unwrap(), json!(42));
        let err = ScalarKind::Int.from_text("4.2", &loc()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IntParsing);
        assert_eq!(err.input, json!("4.2"));
    }

    #[test]
    fn test_int_from_json_is_lax_about_whole_floats() {
        assert_eq!(ScalarKind::Int.from_json(&json!(5.0), &loc()).unwrap(), json!(5));
        assert_eq!(ScalarKind::Int.from_json(&json!("7"), &loc()).unwrap(), json!(7));
        assert_eq!(
            ScalarKind::Int.from_json(&json!(5.5), &loc()).unwrap_err().kind,
            ErrorKind::IntFromFloat
        );
        assert_eq!(
            ScalarKind::Int.from_json(&json!(null), &loc()).unwrap_err().kind,
            ErrorKind::IntType
        );
    }

    #[test]
    fn test_float_accepts_numeric_strings() {
        assert_eq!(json_to_f64(&json!("35.4"), &loc()).unwrap(), 35.4);
        let err = json_to_f64(&json!("thirty five point four"), &loc()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::FloatParsing);
        assert_eq!(
            text_to_f64("inf", &loc()).unwrap_err().kind,
            ErrorKind::FloatParsing
        );
    }

    #[test]
    fn test_strings_are_strict_in_json() {
        assert_eq!(
            ScalarKind::Str.from_json(&json!(12), &loc()).unwrap_err().kind,
            ErrorKind::StringType
        );
        assert_eq!(ScalarKind::Str.from_text("12", &loc()).unwrap(), json!("12"));
    }

    #[test]
    fn test_bool_words() {
        for word in ["true", "True", "1", "on", "YES"] {
            assert_eq!(ScalarKind::Bool.from_text(word, &loc()).unwrap(), json!(true));
        }
        for word in ["false", "0", "off", "No"] {
            assert_eq!(ScalarKind::Bool.from_text(word, &loc()).unwrap(), json!(false));
        }
        assert_eq!(
            ScalarKind::Bool.from_text("maybe", &loc()).unwrap_err().kind,
            ErrorKind::BoolParsing
        );
    }

    #[test]
    fn test_uuid_is_canonicalised() {
        let value = ScalarKind::Uuid
            .from_text("A0B1C2D3E4F5A6B7C8D9E0F1A2B3C4D5", &loc())
            .unwrap();
        assert_eq!(value, json!("a0b1c2d3-e4f5-a6b7-c8d9-e0f1a2b3c4d5"));
        assert_eq!(
            ScalarKind::Uuid.from_text("not-a-uuid", &loc()).unwrap_err().kind,
            ErrorKind::UuidParsing
        );
    }

    #[test]
    fn test_choice_is_case_sensitive() {
        let kind = ScalarKind::Choice(MODELS);
        assert_eq!(kind.from_text("lenet", &loc()).unwrap(), json!("lenet"));

        let err = kind.from_text("AlexNet", &loc()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Enum);
        assert_eq!(err.msg, "Input should be 'alexnet', 'resnet' or 'lenet'");
        assert_eq!(
            err.ctx.unwrap()["expected"],
            json!("'alexnet', 'resnet' or 'lenet'")
        );
    }

    #[test]
    fn test_temporal_kinds() {
        assert_eq!(
            ScalarKind::DateTime.from_json(&json!("2024-01-01T08:00:00"), &loc()).unwrap(),
            json!("2024-01-01T08:00:00")
        );
        assert_eq!(
            ScalarKind::Time.from_json(&json!("08:30"), &loc()).unwrap(),
            json!("08:30:00")
        );
        assert_eq!(
            ScalarKind::Duration.from_json(&json!(90), &loc()).unwrap(),
            json!("PT1M30S")
        );
        assert_eq!(
            ScalarKind::Duration.from_json(&json!("PT2H"), &loc()).unwrap(),
            json!("PT2H")
        );
        assert_eq!(
            ScalarKind::DateTime.from_json(&json!(true), &loc()).unwrap_err().kind,
            ErrorKind::DatetimeParsing
        );
    }

    #[test]
    fn test_choice_schema_lists_members() {
        let schema = serde_json::to_value(ScalarKind::Choice(MODELS).schema().build()).unwrap();
        assert_eq!(schema["type"], "string");
        assert_eq!(schema["enum"], json!(["alexnet", "resnet", "lenet"]));

        let schema = serde_json::to_value(ScalarKind::Uuid.schema().build()).unwrap();
        assert_eq!(schema["format"], "uuid");
    }
}
