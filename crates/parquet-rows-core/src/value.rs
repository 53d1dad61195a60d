//! Row values and the capability interface over host values.
//!
//! The write path never inspects a concrete host value type. It only asks an
//! [`ExternalValue`] for the views it needs (boolean, exact integer, number,
//! text, bytes, date-time). Two adapters ship with the crate: the native
//! [`Value`] enum and `serde_json::Value` (see [`json`]).
//!
//! The read path produces [`Value`]s. 64-bit integers outside the host's
//! safe-integer range are surfaced as [`Value::BigInt`] so they survive
//! hosts whose ordinary number type is an IEEE double.
use std::{borrow::Cow, fmt};

use chrono::{DateTime, Utc};

pub mod json;

/// Largest integer an IEEE-754 double represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;
/// Smallest integer an IEEE-754 double represents exactly.
pub const MIN_SAFE_INTEGER: i64 = -9_007_199_254_740_991;

/// Whether `value` can be surfaced as an ordinary number without loss.
pub fn is_safe_integer(value: i128) -> bool {
    (i128::from(MIN_SAFE_INTEGER)..=i128::from(MAX_SAFE_INTEGER)).contains(&value)
}

/// Host-neutral scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value, or a value that could not be decoded.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer inside the safe-integer range.
    Int(i64),
    /// Integer outside the safe-integer range.
    BigInt(i128),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Classify an integer into [`Value::Int`] or [`Value::BigInt`].
    pub fn integer(value: impl Into<i128>) -> Self {
        let value = value.into();
        if is_safe_integer(value) {
            // In range, so the narrowing below cannot truncate.
            Value::Int(value as i64)
        } else {
            Value::BigInt(value)
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as JSON. Big integers become decimal strings and bytes become
    /// arrays of numbers; non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::BigInt(i) => Json::String(i.to_string()),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::BigInt(i) => write!(f, "{i}n"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::integer(v)
            }
        })*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, i128);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::String(v.to_rfc3339())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Capability interface over a dynamically typed host value.
///
/// Implementors provide the primitive views; the width-checked
/// [`as_int`](ExternalValue::as_int) and [`as_float`](ExternalValue::as_float)
/// are derived from them. Every view returns `None` when the value cannot be
/// seen that way without loss.
pub trait ExternalValue {
    /// Whether the host value is null/absent.
    fn is_null(&self) -> bool;

    /// Boolean view.
    fn as_bool(&self) -> Option<bool>;

    /// Exact integer view. Fractional numbers yield `None`.
    fn as_integer(&self) -> Option<i128>;

    /// Numeric view.
    fn as_number(&self) -> Option<f64>;

    /// Text view.
    fn as_string(&self) -> Option<Cow<'_, str>>;

    /// Byte view.
    fn as_bytes(&self) -> Option<Cow<'_, [u8]>>;

    /// UTC date-time view, used for timestamp and date columns.
    fn as_datetime(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Integer view constrained to a `bits`-wide signed or unsigned range.
    fn as_int(&self, bits: u32, signed: bool) -> Option<i128> {
        let value = self.as_integer()?;
        let (min, max) = if signed {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        };
        (min..=max).contains(&value).then_some(value)
    }

    /// Float view for a `bits`-wide target. Finite values too large for an
    /// `f32` are rejected when `bits == 32`.
    fn as_float(&self, bits: u32) -> Option<f64> {
        let value = self.as_number()?;
        if bits == 32 && value.is_finite() && value.abs() > f64::from(f32::MAX) {
            return None;
        }
        Some(value)
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn exact_integer(value: f64) -> Option<i128> {
    // i128 covers every finite f64 integer below 2^127.
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 1.7e38).then(|| value as i128)
}

impl ExternalValue for Value {
    fn is_null(&self) -> bool {
        Value::is_null(self)
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(i128::from(*i)),
            Value::BigInt(i) => Some(*i),
            Value::Float(f) => exact_integer(*f),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::BigInt(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s)),
            _ => None,
        }
    }

    fn as_bytes(&self) -> Option<Cow<'_, [u8]>> {
        match self {
            Value::Bytes(b) => Some(Cow::Borrowed(b)),
            _ => None,
        }
    }

    fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::String(s) => parse_datetime(s),
            _ => None,
        }
    }
}

impl<T: ExternalValue + ?Sized> ExternalValue for &T {
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
    fn as_bool(&self) -> Option<bool> {
        (**self).as_bool()
    }
    fn as_integer(&self) -> Option<i128> {
        (**self).as_integer()
    }
    fn as_number(&self) -> Option<f64> {
        (**self).as_number()
    }
    fn as_string(&self) -> Option<Cow<'_, str>> {
        (**self).as_string()
    }
    fn as_bytes(&self) -> Option<Cow<'_, [u8]>> {
        (**self).as_bytes()
    }
    fn as_datetime(&self) -> Option<DateTime<Utc>> {
        (**self).as_datetime()
    }
}
