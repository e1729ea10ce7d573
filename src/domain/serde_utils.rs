//! Serde helpers for backend payloads whose numbers may arrive as strings.

use serde::Deserializer;
use serde::de::{self, Visitor};
use std::fmt;

/// Deserializes a `u64` from a number or a numeric string.
pub mod lenient_u64 {
    use super::{Deserializer, LenientVisitor};

    /// # Errors
    ///
    /// Returns an error if the value is neither a non-negative integer nor a
    /// string holding one.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = deserializer.deserialize_any(LenientVisitor)?;
        u64::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Deserializes an `i64` from a number or a numeric string.
pub mod lenient_i64 {
    use super::{Deserializer, LenientVisitor};

    /// # Errors
    ///
    /// Returns an error if the value is neither an integer nor a string holding one.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = deserializer.deserialize_any(LenientVisitor)?;
        i64::try_from(value).map_err(serde::de::Error::custom)
    }
}

struct LenientVisitor;

impl Visitor<'_> for LenientVisitor {
    type Value = i128;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer or a string holding an integer")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(i128::from(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(i128::from(value))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        if value.is_finite() && value.fract() == 0.0 {
            Ok(value as i128)
        } else {
            Err(E::custom(format!("expected an integer, got {value}")))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        value.trim().parse::<i128>().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(with = "super::lenient_u64")]
        id: u64,
        #[serde(with = "super::lenient_i64")]
        at: i64,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        let a: Payload = serde_json::from_str(r#"{"id": 7, "at": "1735000000000"}"#).unwrap();
        let b: Payload = serde_json::from_str(r#"{"id": "7", "at": 1735000000000}"#).unwrap();

        assert_eq!(a.id, 7);
        assert_eq!(b.id, 7);
        assert_eq!(a.at, 1_735_000_000_000);
        assert_eq!(b.at, a.at);
    }

    #[test]
    fn test_rejects_negative_id_and_garbage() {
        assert!(serde_json::from_str::<Payload>(r#"{"id": -1, "at": 0}"#).is_err());
        assert!(serde_json::from_str::<Payload>(r#"{"id": "x", "at": 0}"#).is_err());
    }
}
