//! Date, time and duration coercion
//!
//! Timestamps keep whatever offset the client sent: naive values stay naive
//! and aware values keep their original offset. Arithmetic between a naive
//! and an aware value is refused rather than guessed.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// A point in time with or without a UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl Timestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::Aware(aware));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(Self::Naive)
    }

    /// Unix seconds, interpreted in UTC
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_unix(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() {
            return None;
        }
        let whole = seconds.floor();
        let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
        DateTime::<Utc>::from_timestamp(whole as i64, nanos)
            .map(|utc| Self::Aware(utc.fixed_offset()))
    }

    pub fn checked_add(self, delta: TimeDelta) -> Option<Self> {
        match self {
            Self::Naive(naive) => naive.checked_add_signed(delta).map(Self::Naive),
            Self::Aware(aware) => aware.checked_add_signed(delta).map(Self::Aware),
        }
    }

    /// `self - earlier`; `None` when one side is naive and the other aware
    pub fn since(self, earlier: Self) -> Option<TimeDelta> {
        match (self, earlier) {
            (Self::Naive(a), Self::Naive(b)) => Some(a.signed_duration_since(b)),
            (Self::Aware(a), Self::Aware(b)) => Some(a.signed_duration_since(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Aware(aware) => f.write_str(&aware.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(raw) => Self::parse(&raw)
                .ok_or_else(|| de::Error::custom(format!("invalid datetime `{raw}`"))),
            Value::Number(n) => n
                .as_f64()
                .and_then(Self::from_unix)
                .ok_or_else(|| de::Error::custom("invalid unix timestamp")),
            other => Err(de::Error::custom(format!("expected datetime, got {other}"))),
        }
    }
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

/// A span of time exchanged as an ISO 8601 duration (`P1DT2H`, `PT0.5S`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDuration(pub TimeDelta);

impl Serialize for IsoDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(self.0))
    }
}

impl<'de> Deserialize<'de> for IsoDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(raw) => parse_duration(&raw)
                .map(Self)
                .ok_or_else(|| de::Error::custom(format!("invalid duration `{raw}`"))),
            Value::Number(n) => n
                .as_f64()
                .and_then(seconds_to_delta)
                .map(Self)
                .ok_or_else(|| de::Error::custom("invalid duration seconds")),
            other => Err(de::Error::custom(format!("expected duration, got {other}"))),
        }
    }
}

/// Parse `[-]PnWnDTnHnMnS` or a plain number of seconds
pub fn parse_duration(raw: &str) -> Option<TimeDelta> {
    let trimmed = raw.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_delta(seconds);
    }

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let body = unsigned
        .strip_prefix('P')
        .or_else(|| unsigned.strip_prefix('p'))?;

    let (date_part, time_part) = match body.split_once(['T', 't']) {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    if date_part.is_empty() && time_part.is_none_or(str::is_empty) {
        return None;
    }

    let mut seconds = sum_designators(date_part, &[('W', 604_800.0), ('D', 86_400.0)])?;
    if let Some(time) = time_part {
        if time.is_empty() {
            return None;
        }
        seconds += sum_designators(time, &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)])?;
    }

    seconds_to_delta(if negative { -seconds } else { seconds })
}

/// Sum `<number><unit>` pairs; units must appear in the declared order
fn sum_designators(part: &str, units: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut number = String::new();
    let mut next_unit = 0;

    for ch in part.chars() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            number.push(if ch == ',' { '.' } else { ch });
            continue;
        }
        let unit = ch.to_ascii_uppercase();
        let offset = units
            .iter()
            .skip(next_unit)
            .position(|(candidate, _)| *candidate == unit)?;
        let (_, scale) = units.get(next_unit + offset)?;
        let value: f64 = number.parse().ok()?;
        total += value * scale;
        number.clear();
        next_unit += offset + 1;
    }

    number.is_empty().then_some(total)
}

#[allow(clippy::cast_possible_truncation)]
pub fn seconds_to_delta(seconds: f64) -> Option<TimeDelta> {
    let micros = (seconds * 1e6).round();
    if !micros.is_finite() || micros.abs() >= 9.2e18 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

/// Shortest ISO 8601 rendering: `P1D`, `PT1M30S`, `-PT0.25S`, `PT0S`
pub fn format_duration(delta: TimeDelta) -> String {
    let negative = delta < TimeDelta::zero();
    let magnitude = delta.abs();
    let total = magnitude.num_seconds();
    let micros = magnitude.subsec_nanos() / 1_000;

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut out = String::from(if negative { "-P" } else { "P" });
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }

    let has_clock = hours > 0 || minutes > 0 || seconds > 0 || micros > 0;
    if has_clock || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || micros > 0 || (hours == 0 && minutes == 0) {
            if micros > 0 {
                let fraction = format!("{micros:06}");
                out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
            } else {
                out.push_str(&format!("{seconds}S"));
            }
        }
    }
    out
}
