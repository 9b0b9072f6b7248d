//! Kubernetes resource quantity parsing
//!
//! Converts the string form used in pod specs ("250m", "512Mi", "1.5") into
//! exact [`Quantity`] values and back.

use crate::decimal::Quantity;
use crate::error::{Result, ScalingError};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use std::str::FromStr;

/// Binary suffixes, powers of 1024
const BINARY_SUFFIXES: &[(&str, u32)] = &[
    ("Ki", 1),
    ("Mi", 2),
    ("Gi", 3),
    ("Ti", 4),
    ("Pi", 5),
    ("Ei", 6),
];

/// Decimal suffixes, as powers of ten
const DECIMAL_SUFFIXES: &[(char, i64)] = &[
    ('m', -3),
    ('k', 3),
    ('M', 6),
    ('G', 9),
    ('T', 12),
    ('P', 15),
    ('E', 18),
];

/// Largest decimal exponent, in either direction, a parsed quantity may carry
pub const MAX_QUANTITY_SCALE: i64 = 64;

/// Parse a Kubernetes quantity string into an exact decimal
pub fn parse_quantity(input: &str) -> Result<Quantity> {
    let value = parse_unbounded(input)?;
    let scale = value.as_bigint_and_exponent().1;
    if scale.abs() > MAX_QUANTITY_SCALE {
        return Err(ScalingError::invalid_input(format!(
            "quantity {:?} has an out of range exponent",
            input
        )));
    }
    Ok(value)
}

fn parse_unbounded(input: &str) -> Result<Quantity> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScalingError::invalid_input("empty quantity"));
    }

    for (suffix, power) in BINARY_SUFFIXES {
        if let Some(number) = trimmed.strip_suffix(suffix) {
            let factor = BigInt::from(1024u32).pow(*power);
            return Ok(parse_number(number, input)? * BigDecimal::new(factor, 0));
        }
    }

    if let Some(last) = trimmed.chars().last() {
        if let Some((_, exponent)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == last) {
            let number = &trimmed[..trimmed.len() - last.len_utf8()];
            return Ok(parse_number(number, input)? * BigDecimal::new(BigInt::from(1u8), -exponent));
        }
    }

    parse_number(trimmed, input)
}

fn parse_number(number: &str, original: &str) -> Result<Quantity> {
    if number.is_empty() || number.starts_with(['e', 'E']) {
        return Err(ScalingError::invalid_input(format!(
            "malformed quantity {:?}",
            original
        )));
    }
    BigDecimal::from_str(number)
        .map_err(|_| ScalingError::invalid_input(format!("malformed quantity {:?}", original)))
}

/// Render a quantity as a plain decimal string without trailing zeros
pub fn format_quantity(value: &Quantity) -> String {
    let normalized = value.normalized();
    if normalized.as_bigint_and_exponent().1 < 0 {
        normalized.with_scale(0).to_string()
    } else {
        normalized.to_string()
    }
}

/// Serde adapter for quantity fields
///
/// Accepts a JSON string in any form understood by [`parse_quantity`] or a
/// JSON number; always writes a plain decimal string.
pub mod serde_quantity {
    use super::{format_quantity, parse_quantity};
    use crate::decimal::Quantity;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &Quantity, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_quantity(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Quantity, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(QuantityVisitor)
    }

    struct QuantityVisitor;

    impl<'de> Visitor<'de> for QuantityVisitor {
        type Value = Quantity;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a resource quantity string or number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Quantity, E> {
            parse_quantity(value).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Quantity, E> {
            Ok(Quantity::from(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Quantity, E> {
            Ok(Quantity::from(value))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Quantity, E> {
            if !value.is_finite() {
                return Err(E::custom("quantity must be finite"));
            }
            // shortest round-trip representation, so 0.1 stays 0.1
            parse_quantity(&value.to_string()).map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_quantity("100").unwrap(), dec(100, 0));
        assert_eq!(parse_quantity("0.5").unwrap(), dec(5, 1));
        assert_eq!(parse_quantity("1e3").unwrap(), dec(1000, 0));
        assert_eq!(parse_quantity(" 2 ").unwrap(), dec(2, 0));
    }

    #[test]
    fn test_parse_decimal_suffixes() {
        assert_eq!(parse_quantity("250m").unwrap(), dec(25, 2));
        assert_eq!(parse_quantity("1500m").unwrap(), dec(15, 1));
        assert_eq!(parse_quantity("2k").unwrap(), dec(2000, 0));
        assert_eq!(parse_quantity("128M").unwrap(), dec(128, -6));
        assert_eq!(parse_quantity("1G").unwrap(), dec(1, -9));
        assert_eq!(parse_quantity("1E").unwrap(), dec(1, -18));
    }

    #[test]
    fn test_parse_binary_suffixes() {
        assert_eq!(parse_quantity("1Ki").unwrap(), dec(1024, 0));
        assert_eq!(parse_quantity("512Mi").unwrap(), dec(536_870_912, 0));
        assert_eq!(parse_quantity("1Gi").unwrap(), dec(1_073_741_824, 0));
        assert_eq!(parse_quantity("0.5Gi").unwrap(), dec(536_870_912, 0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("Mi").is_err());
        assert!(parse_quantity("m").is_err());
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("10Xi").is_err());
    }

    #[test]
    fn test_parse_rejects_extreme_exponents() {
        assert!(parse_quantity("1e4294967290").is_err());
        assert!(parse_quantity("1e-65").is_err());
        assert!(parse_quantity("1e65").is_err());
        assert_eq!(parse_quantity("1e64").unwrap(), dec(1, -64));
        assert_eq!(parse_quantity("1E").unwrap(), dec(1, -18));
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(&dec(25000, 5)), "0.25");
        assert_eq!(format_quantity(&dec(1, -6)), "1000000");
        assert_eq!(format_quantity(&dec(150, 0)), "150");
    }

    #[test]
    fn test_serde_quantity_accepts_strings_and_numbers() {
        #[derive(serde::Deserialize, serde::Serialize)]
        struct Holder {
            #[serde(with = "serde_quantity")]
            value: Quantity,
        }

        let from_str: Holder = serde_json::from_str(r#"{"value":"250m"}"#).unwrap();
        assert_eq!(from_str.value, dec(25, 2));

        let from_int: Holder = serde_json::from_str(r#"{"value":3}"#).unwrap();
        assert_eq!(from_int.value, dec(3, 0));

        let from_float: Holder = serde_json::from_str(r#"{"value":0.1}"#).unwrap();
        assert_eq!(from_float.value, dec(1, 1));

        let json = serde_json::to_string(&from_str).unwrap();
        assert_eq!(json, r#"{"value":"0.25"}"#);
    }
}
