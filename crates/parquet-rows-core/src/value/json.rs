//! [`ExternalValue`] adapter for `serde_json::Value`.
//!
//! JSON has no integer width, byte or date-time types, so the adapter reads:
//! - integers from JSON numbers without a fractional part, or from decimal
//!   strings (the form [`Value::to_json`](super::Value::to_json) uses for
//!   big integers);
//! - bytes from arrays of numbers in `0..=255`;
//! - date-times from RFC 3339 strings.
use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use super::{ExternalValue, exact_integer, parse_datetime};

impl ExternalValue for Json {
    fn is_null(&self) -> bool {
        Json::is_null(self)
    }

    fn as_bool(&self) -> Option<bool> {
        Json::as_bool(self)
    }

    fn as_integer(&self) -> Option<i128> {
        match self {
            Json::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .or_else(|| n.as_f64().and_then(exact_integer)),
            Json::String(s) => s.trim().parse::<i128>().ok(),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Json::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<Cow<'_, str>> {
        Json::as_str(self).map(Cow::Borrowed)
    }

    fn as_bytes(&self) -> Option<Cow<'_, [u8]>> {
        let items = Json::as_array(self)?;
        items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Cow::Owned)
    }

    fn as_datetime(&self) -> Option<DateTime<Utc>> {
        Json::as_str(self).and_then(parse_datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_come_from_numbers_and_decimal_strings() {
        assert_eq!(json!(42).as_integer(), Some(42));
        assert_eq!(json!(u64::MAX).as_integer(), Some(i128::from(u64::MAX)));
        assert_eq!(json!(3.0).as_integer(), Some(3));
        assert_eq!(json!(3.25).as_integer(), None);
        assert_eq!(json!("9007199254740993").as_integer(), Some(9_007_199_254_740_993));
        assert_eq!(json!(true).as_integer(), None);
        assert_eq!(json!(300).as_int(8, false), None);
    }

    #[test]
    fn bytes_come_from_small_number_arrays() {
        assert_eq!(
            json!([0, 127, 255]).as_bytes().as_deref(),
            Some(&[0u8, 127, 255][..])
        );
        assert!(json!([256]).as_bytes().is_none());
        assert!(json!([-1]).as_bytes().is_none());
        assert!(json!("abc").as_bytes().is_none());
    }

    #[test]
    fn strings_and_datetimes() {
        assert_eq!(json!("oatmeal").as_string().as_deref(), Some("oatmeal"));
        assert!(json!(1).as_string().is_none());
        let dt = json!("1970-01-02T00:00:00+00:00").as_datetime().unwrap();
        assert_eq!(dt.timestamp(), 86_400);
        assert!(json!(null).is_null());
    }
}
