//! Column codecs for values the relational store keeps in a portable primitive form.
//!
//! Array-valued attributes are stored as JSON text, flags as 0/1 integers, money
//! as integer minor units and timestamps as RFC 3339 UTC text. Each semantic
//! type has one codec with a symmetric `encode`/`decode` pair, and the row
//! mapping in `queries` goes through these codecs only.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};

/// Symmetric mapping between a domain value and its stored column value.
pub trait ColumnCodec {
    type Value;
    type Column;

    fn encode(value: &Self::Value) -> Self::Column;
    fn decode(column: Self::Column) -> Result<Self::Value>;
}

/// Ordered list of strings stored as a JSON array in a text column.
pub struct JsonStringArray;

impl ColumnCodec for JsonStringArray {
    type Value = Vec<String>;
    type Column = String;

    fn encode(value: &Vec<String>) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decoding is lenient: empty text is an empty list and text that is not a
    /// JSON array is read as a comma-separated list.
    fn decode(column: String) -> Result<Vec<String>> {
        Ok(Self::normalize(Some(&column)))
    }
}

impl JsonStringArray {
    /// Normalizes free-form input (a JSON array or a comma-separated list).
    pub fn normalize(input: Option<&str>) -> Vec<String> {
        let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return Vec::new();
        };

        if raw.starts_with('[') {
            if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
                return items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(text) => Some(text),
                        serde_json::Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect();
            }
        }

        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Boolean stored as a 0/1 integer.
pub struct BooleanFlag;

impl ColumnCodec for BooleanFlag {
    type Value = bool;
    type Column = i64;

    fn encode(value: &bool) -> i64 {
        if *value { 1 } else { 0 }
    }

    fn decode(column: i64) -> Result<bool> {
        Ok(column == 1)
    }
}

impl BooleanFlag {
    /// Reads a form value; only `true` and `1` are truthy.
    pub fn parse(input: Option<&str>) -> bool {
        matches!(
            input.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
            Some("true") | Some("1")
        )
    }
}

/// Fixed-point amount with two decimal places, held as integer minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor_units(minor: i64) -> Self {
        Money(minor)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Parses a decimal amount such as `1500`, `1500.5` or `1500.50`.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        let invalid = || Error::Validation(format!("Invalid monetary amount: '{}'", input));

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || fraction.len() > 2
        {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let minor = whole
            .checked_mul(100)
            .and_then(|m| m.checked_add(cents))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -minor } else { minor }))
    }

    /// Rounds a finite amount to the nearest minor unit.
    pub fn from_f64(value: f64) -> Option<Self> {
        let minor = (value * 100.0).round();
        (minor.is_finite() && minor.abs() <= i64::MAX as f64).then(|| Money(minor as i64))
    }

    /// Parses an optional form value, falling back to zero when absent or non-numeric.
    ///
    /// Numeric text the strict decimal form rejects (`+100`, `1e3`, `12.345`)
    /// is read as a number and rounded to minor units.
    pub fn coerce(input: Option<&str>) -> Self {
        input
            .and_then(|raw| {
                Money::parse(raw)
                    .ok()
                    .or_else(|| raw.trim().parse::<f64>().ok().and_then(Money::from_f64))
            })
            .unwrap_or(Money::ZERO)
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Money::from_f64(value).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid monetary amount: {}", value))
            }),
            Raw::Text(text) => Money::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

/// Money stored as integer minor units.
pub struct DecimalMoney;

impl ColumnCodec for DecimalMoney {
    type Value = Money;
    type Column = i64;

    fn encode(value: &Money) -> i64 {
        value.minor_units()
    }

    fn decode(column: i64) -> Result<Money> {
        Ok(Money::from_minor_units(column))
    }
}

/// UTC timestamp stored as RFC 3339 text with millisecond precision.
///
/// The fixed width keeps lexical and chronological order identical.
pub struct TimestampText;

impl ColumnCodec for TimestampText {
    type Value = DateTime<Utc>;
    type Column = String;

    fn encode(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn decode(column: String) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&column)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", column, e)))
    }
}

/// Parses an optional numeric form value, returning `fallback` when absent or malformed.
pub fn coerce_f64(input: Option<&str>, fallback: f64) -> f64 {
    input
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(fallback)
}

/// Integer variant of [`coerce_f64`]; fractional input is truncated.
pub fn coerce_i64(input: Option<&str>, fallback: i64) -> i64 {
    let value = coerce_f64(input, f64::NAN);
    if value.is_finite() {
        value.trunc() as i64
    } else {
        fallback
    }
}
