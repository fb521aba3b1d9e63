//! Shared helpers for venue REST responses.
//!
//! Venue APIs are loose with number types: the same field arrives as a JSON
//! number in one response and a quoted string in the next. `flex_decimal`
//! accepts both and treats anything unparseable as zero, which downstream
//! scoring already guards against.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};
use std::fmt;
use std::str::FromStr;

pub(crate) fn flex_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlexVisitor;

    impl<'de> Visitor<'de> for FlexVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
            Ok(Decimal::from_f64(v).unwrap_or(Decimal::ZERO))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
            Ok(Decimal::from_str(v)
                .or_else(|_| Decimal::from_scientific(v))
                .unwrap_or(Decimal::ZERO))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_none<E: de::Error>(self) -> Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Decimal, D2::Error> {
            d.deserialize_any(FlexVisitor)
        }
    }

    deserializer.deserialize_any(FlexVisitor)
}

/// Default request timeout for venue APIs.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::flex_decimal")]
        value: Decimal,
    }

    #[test]
    fn test_accepts_number_and_string() {
        let n: Probe = serde_json::from_str(r#"{"value": 123.45}"#).unwrap();
        assert_eq!(n.value, dec!(123.45));

        let s: Probe = serde_json::from_str(r#"{"value": "678.9"}"#).unwrap();
        assert_eq!(s.value, dec!(678.9));
    }

    #[test]
    fn test_garbage_and_null_become_zero() {
        let g: Probe = serde_json::from_str(r#"{"value": "n/a"}"#).unwrap();
        assert_eq!(g.value, Decimal::ZERO);

        let null: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(null.value, Decimal::ZERO);

        let missing: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.value, Decimal::ZERO);
    }

    #[test]
    fn test_scientific_notation_string() {
        let p: Probe = serde_json::from_str(r#"{"value": "1.5e3"}"#).unwrap();
        assert_eq!(p.value, dec!(1500));
    }
}
