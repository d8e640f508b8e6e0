//! Versioned durable payload.
//!
//! The stored shape is `{ "version": 1, "items": [...] }`. A payload whose
//! version is anything other than [`SCHEMA_VERSION`] is rejected outright;
//! there is no migration path.

use basket_core::LineItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Current schema version of the stored cart.
pub const SCHEMA_VERSION: u32 = 1;

/// Reasons a stored payload cannot be restored.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload is not valid JSON or does not have the expected shape.
    #[error("malformed cart payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload was written by a different schema version.
    #[error("cart payload version {found} does not match {expected}")]
    VersionMismatch {
        /// Version found in the payload, rendered as JSON (`null` if absent).
        found: String,
        /// Version this build reads.
        expected: u32,
    },
}

/// Full cart snapshot as written to durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPayload {
    pub version: u32,
    pub items: Vec<LineItem>,
}

impl CartPayload {
    /// Snapshot the given items under the current schema version.
    #[must_use]
    pub const fn new(items: Vec<LineItem>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            items,
        }
    }

    /// Decode a stored payload, checking the version before anything else.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] if `raw` is not JSON or its items
    /// do not parse, and [`PayloadError::VersionMismatch`] if the version is
    /// missing or differs from [`SCHEMA_VERSION`].
    pub fn decode(raw: &str) -> Result<Self, PayloadError> {
        let mut value: Value = serde_json::from_str(raw)?;

        // JSON numbers compare by value, so `1.0` is the current version too
        let version = value.get("version");
        let current = version
            .and_then(Value::as_f64)
            .is_some_and(|v| (v - f64::from(SCHEMA_VERSION)).abs() < f64::EPSILON);
        if !current {
            return Err(PayloadError::VersionMismatch {
                found: version.map_or_else(|| "null".to_string(), Value::to_string),
                expected: SCHEMA_VERSION,
            });
        }
        if let Some(version) = value.get_mut("version") {
            *version = Value::from(SCHEMA_VERSION);
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Encode for durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass-through field cannot be serialized.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Sum of quantities across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use basket_core::{Price, Sku};

    use super::*;

    #[test]
    fn test_decode_current_version() {
        let raw = r#"{"version":1,"items":[{"sku":"A","quantity":2,"price":"19.99"}]}"#;
        let payload = CartPayload::decode(raw).unwrap();
        assert_eq!(payload.version, SCHEMA_VERSION);
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].price, Price::from_minor_units(1999));
        assert_eq!(payload.item_count(), 2);
    }

    #[test]
    fn test_decode_other_version() {
        let err = CartPayload::decode(r#"{"version":2,"items":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::VersionMismatch { ref found, expected: 1 } if found == "2"
        ));
    }

    #[test]
    fn test_decode_integral_float_version() {
        let payload =
            CartPayload::decode(r#"{"version":1.0,"items":[{"sku":"A","quantity":1,"price":250}]}"#)
                .unwrap();
        assert_eq!(payload.version, SCHEMA_VERSION);
        assert_eq!(payload.item_count(), 1);

        assert!(matches!(
            CartPayload::decode(r#"{"version":1.5,"items":[]}"#),
            Err(PayloadError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_missing_or_string_version() {
        assert!(matches!(
            CartPayload::decode(r#"{"items":[]}"#),
            Err(PayloadError::VersionMismatch { .. })
        ));
        assert!(matches!(
            CartPayload::decode(r#"{"version":"1","items":[]}"#),
            Err(PayloadError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            CartPayload::decode("{not json"),
            Err(PayloadError::Malformed(_))
        ));
        assert!(matches!(
            CartPayload::decode(r#"{"version":1,"items":[{"quantity":1}]}"#),
            Err(PayloadError::Malformed(_))
        ));
    }

    #[test]
    fn test_encode_shape() {
        let item = LineItem::new(Sku::parse("A").unwrap(), 1, Price::from_minor_units(500));
        let encoded = CartPayload::new(vec![item]).encode().unwrap();
        assert_eq!(
            encoded,
            r#"{"version":1,"items":[{"sku":"A","quantity":1,"price":500}]}"#
        );
    }
}
