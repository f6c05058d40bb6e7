//! Conversions from raw property strings to typed values.
//!
//! Every converter is a pure function failing with a [`ConversionError`] naming the expected type and the offending
//! value, e.g. `Expected Int32: abc`. [`FromValue`] lifts the converters to [`Value`]s so that typed property
//! access works the same way for every type.

use crate::atom::Value;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// A raw value could not be converted to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected {expected}: {value}")]
pub struct ConversionError {
    expected: &'static str,
    value: String,
}

impl ConversionError {
    /// Creates an error for `value` that is not a valid `expected` type.
    pub fn new(expected: &'static str, value: impl Into<String>) -> Self {
        Self {
            expected,
            value: value.into(),
        }
    }

    /// Name of the type the value was expected to be.
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    /// The raw value that failed to convert.
    pub fn value(&self) -> &str {
        &self.value
    }
}

type Result<T> = std::result::Result<T, ConversionError>;

/// Converts `0`, `1`, `true` and `false` (in any letter case) to a boolean.
pub fn to_bool(raw: &str) -> Result<bool> {
    match raw.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other if other.eq_ignore_ascii_case("true") => Ok(true),
        other if other.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConversionError::new("Boolean", raw)),
    }
}

/// Converts a decimal string to a 32-bit signed integer.
pub fn to_i32(raw: &str) -> Result<i32> {
    raw.trim().parse().map_err(|_| ConversionError::new("Int32", raw))
}

/// Converts a decimal string to a 64-bit signed integer.
pub fn to_i64(raw: &str) -> Result<i64> {
    raw.trim().parse().map_err(|_| ConversionError::new("Int64", raw))
}

/// Converts a decimal string to a 64-bit unsigned integer.
pub fn to_u64(raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| ConversionError::new("UInt64", raw))
}

/// Converts a decimal string to a double precision float.
pub fn to_f64(raw: &str) -> Result<f64> {
    raw.trim().parse().map_err(|_| ConversionError::new("Double", raw))
}

/// Converts a GUID string in any of the usual notations to a [`Uuid`].
pub fn to_guid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ConversionError::new("Guid", raw))
}

/// Converts an RFC 3339 timestamp, or fractional seconds since the Unix epoch, to a date-time.
///
/// RFC 3339 timestamps keep their offset; epoch timestamps are in UTC.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::convert::to_datetime;
/// let updated = to_datetime("2014-02-17T17:46:39Z").unwrap();
/// let dispatched = to_datetime("1392659199.313").unwrap();
///
/// assert_eq!(updated.timestamp(), 1392659199);
/// assert_eq!(dispatched.timestamp_millis(), 1392659199313);
/// ```
pub fn to_datetime(raw: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp);
    }

    let seconds: f64 = trimmed.parse().map_err(|_| ConversionError::new("DateTime", raw))?;
    if !seconds.is_finite() {
        return Err(ConversionError::new("DateTime", raw));
    }

    let millis = (seconds * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(DateTime::<FixedOffset>::from)
        .ok_or_else(|| ConversionError::new("DateTime", raw))
}

/// Converts an absolute URI string to a [`Url`].
pub fn to_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|_| ConversionError::new("Uri", raw))
}

/// Converts a non-negative number of seconds, possibly fractional, to a [`Duration`].
pub fn to_duration(raw: &str) -> Result<Duration> {
    let seconds = to_f64(raw).map_err(|_| ConversionError::new("TimeSpan", raw))?;

    Duration::try_from_secs_f64(seconds).map_err(|_| ConversionError::new("TimeSpan", raw))
}

/// Converts a string to an enumeration using its [`FromStr`] implementation.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::convert::to_enum;
/// # use splunk_sdk::DispatchState;
/// assert_eq!(DispatchState::Done, to_enum::<DispatchState>("DONE", "DispatchState").unwrap());
/// assert!(to_enum::<DispatchState>("SLEEPING", "DispatchState").is_err());
/// ```
pub fn to_enum<T: FromStr>(raw: &str, type_name: &'static str) -> Result<T> {
    raw.trim().parse().map_err(|_| ConversionError::new(type_name, raw))
}

/// Makes this type obtainable from a parsed property [`Value`].
pub trait FromValue: Sized {
    /// Converts `value` to this type.
    fn from_value(value: &Value) -> Result<Self>;
}

fn scalar<'v>(value: &'v Value, expected: &'static str) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| ConversionError::new(expected, value.to_string()))
}

/// Implements [`FromValue`] for the given types using a scalar converter.
macro_rules! from_value_using_converter {
    ($($t:ty as $name:expr => $converter:path),*) => {
        $(
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self> {
                $converter(scalar(value, $name)?)
            }
        })*
    }
}

from_value_using_converter![
    bool as "Boolean" => to_bool,
    i32 as "Int32" => to_i32,
    i64 as "Int64" => to_i64,
    u64 as "UInt64" => to_u64,
    f64 as "Double" => to_f64,
    Uuid as "Guid" => to_guid,
    DateTime<FixedOffset> as "DateTime" => to_datetime,
    Url as "Uri" => to_url,
    Duration as "TimeSpan" => to_duration
];

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        scalar(value, "String").map(str::to_owned)
    }
}

impl FromValue for Vec<String> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Scalar(text) => Ok(vec![text.clone()]),
            Value::List(items) => items
                .iter()
                .map(|item| scalar(item, "String[]").map(str::to_owned))
                .collect(),
            Value::Map(_) => Err(ConversionError::new("String[]", value.to_string())),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

/// Implements [`FromValue`] for enumerations through [`to_enum`].
macro_rules! from_value_using_from_str {
    ($($t:ty as $name:expr),*) => {
        $(
        impl $crate::convert::FromValue for $t {
            fn from_value(value: &$crate::atom::Value) -> std::result::Result<Self, $crate::convert::ConversionError> {
                let raw = value
                    .as_str()
                    .ok_or_else(|| $crate::convert::ConversionError::new($name, value.to_string()))?;
                $crate::convert::to_enum(raw, $name)
            }
        })*
    }
}

pub(crate) use from_value_using_from_str;
