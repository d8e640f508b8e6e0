//! Cart line item.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Price, Sku};

/// One product variant and its quantity within a cart.
///
/// Display metadata (`name`, `image`, `url_key`, `note`) is opaque to the
/// cart. Any field the cart does not know about, such as identifiers
/// correlating the item with an external order system, is kept in `extra`
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product variant identifier; unique within a cart.
    pub sku: Sku,
    /// Number of units. Callers keep this at 1 or more.
    pub quantity: u32,
    /// Unit price.
    pub price: Price,
    /// Product display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Path segment of the product page.
    #[serde(
        default,
        rename = "urlKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub url_key: Option<String>,
    /// Free-form note attached by the shopper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Pass-through fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    /// Create a line item with no display metadata.
    #[must_use]
    pub fn new(sku: Sku, quantity: u32, price: Price) -> Self {
        Self {
            sku,
            quantity,
            price,
            name: None,
            image: None,
            url_key: None,
            note: None,
            extra: Map::new(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the product page key.
    #[must_use]
    pub fn with_url_key(mut self, url_key: impl Into<String>) -> Self {
        self.url_key = Some(url_key.into());
        self
    }

    /// Attach a pass-through field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Quantity times unit price.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sku(s: &str) -> Sku {
        Sku::parse(s).unwrap()
    }

    #[test]
    fn test_deserialize_storefront_record() {
        let raw = json!({
            "sku": "TEE-BLK-M",
            "quantity": 2,
            "price": "24.00",
            "name": "Black Tee",
            "image": "/media/tee.jpg",
            "urlKey": "black-tee",
            "square_item_id": "ITEM123",
            "square_variation_id": "VAR456"
        });

        let item: LineItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.sku, sku("TEE-BLK-M"));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price, Price::from_minor_units(2400));
        assert_eq!(item.url_key.as_deref(), Some("black-tee"));
        assert_eq!(item.extra.get("square_item_id"), Some(&json!("ITEM123")));
        assert_eq!(item.extra.get("square_variation_id"), Some(&json!("VAR456")));
    }

    #[test]
    fn test_serialize_keeps_pass_through_fields() {
        let item = LineItem::new(sku("MUG"), 1, Price::from_minor_units(1200))
            .with_url_key("mug")
            .with_extra("square_item_id", "ITEM9");

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["urlKey"], json!("mug"));
        assert_eq!(value["square_item_id"], json!("ITEM9"));
        assert_eq!(value["price"], json!(1200));
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_missing_sku_is_rejected() {
        let raw = json!({ "quantity": 1, "price": 100 });
        assert!(serde_json::from_value::<LineItem>(raw).is_err());
    }

    #[test]
    fn test_line_total() {
        let item = LineItem::new(sku("A"), 3, Price::parse("2.50").unwrap());
        assert_eq!(item.line_total(), Price::from_minor_units(750));
    }
}
