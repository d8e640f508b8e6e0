//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `BASKET_STORAGE_KEY` - Durable storage key for the cart payload (default: cart)
//! - `BASKET_COUNT_HINT_KEY` - Side-channel key for the item count hint (default: `cart_items_count`)
//! - `BASKET_PERSIST_DEBOUNCE_MS` - Quiet period before a durable write (default: 300)
//! - `BASKET_FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping becomes free (default: 150)
//! - `BASKET_FLAT_SHIPPING` - Shipping charged below the threshold (default: 10)
//! - `BASKET_STORAGE_DIR` - Directory for file-backed storage (default: .basket)

use std::path::PathBuf;
use std::time::Duration;

use basket_core::Price;
use thiserror::Error;

const DEFAULT_STORAGE_KEY: &str = "cart";
const DEFAULT_COUNT_HINT_KEY: &str = "cart_items_count";
const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_FREE_SHIPPING_THRESHOLD: Price = Price::from_minor_units(15_000);
const DEFAULT_FLAT_SHIPPING: Price = Price::from_minor_units(1_000);
const DEFAULT_STORAGE_DIR: &str = ".basket";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key the serialized cart is stored under
    pub storage_key: String,
    /// Key of the item count hint in the side channel
    pub count_hint_key: String,
    /// Quiet period a burst of mutations must end with before a write
    pub persist_debounce: Duration,
    /// Subtotal at or above which shipping is free
    pub free_shipping_threshold: Price,
    /// Shipping charged below the threshold
    pub flat_shipping: Price,
    /// Directory used by file-backed storage
    pub storage_dir: PathBuf,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            count_hint_key: DEFAULT_COUNT_HINT_KEY.to_string(),
            persist_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            flat_shipping: DEFAULT_FLAT_SHIPPING,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_key = lookup("BASKET_STORAGE_KEY").unwrap_or(defaults.storage_key);
        validate_key(&storage_key, "BASKET_STORAGE_KEY")?;

        let count_hint_key = lookup("BASKET_COUNT_HINT_KEY").unwrap_or(defaults.count_hint_key);
        validate_key(&count_hint_key, "BASKET_COUNT_HINT_KEY")?;

        let persist_debounce = match lookup("BASKET_PERSIST_DEBOUNCE_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| invalid("BASKET_PERSIST_DEBOUNCE_MS", &e))?,
            None => defaults.persist_debounce,
        };

        let free_shipping_threshold = match lookup("BASKET_FREE_SHIPPING_THRESHOLD") {
            Some(raw) => {
                Price::parse(&raw).map_err(|e| invalid("BASKET_FREE_SHIPPING_THRESHOLD", &e))?
            }
            None => defaults.free_shipping_threshold,
        };

        let flat_shipping = match lookup("BASKET_FLAT_SHIPPING") {
            Some(raw) => Price::parse(&raw).map_err(|e| invalid("BASKET_FLAT_SHIPPING", &e))?,
            None => defaults.flat_shipping,
        };

        let storage_dir = lookup("BASKET_STORAGE_DIR").map_or(defaults.storage_dir, PathBuf::from);

        Ok(Self {
            storage_key,
            count_hint_key,
            persist_debounce,
            free_shipping_threshold,
            flat_shipping,
            storage_dir,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn invalid(key: &str, err: &impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), err.to_string())
}

/// Keys end up as file names and cookie pair names.
fn validate_key(value: &str, var_name: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("{value:?} may only contain ASCII letters, digits, '_' and '-'"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, CartConfig::default());
        assert_eq!(config.storage_key, "cart");
        assert_eq!(config.count_hint_key, "cart_items_count");
        assert_eq!(config.persist_debounce, Duration::from_millis(300));
        assert_eq!(config.free_shipping_threshold.minor_units(), 15_000);
        assert_eq!(config.flat_shipping.minor_units(), 1_000);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BASKET_STORAGE_KEY", "cart-v1"),
            ("BASKET_PERSIST_DEBOUNCE_MS", "50"),
            ("BASKET_FREE_SHIPPING_THRESHOLD", "99.50"),
            ("BASKET_FLAT_SHIPPING", "4.95"),
            ("BASKET_STORAGE_DIR", "/tmp/basket"),
        ])
        .unwrap();

        assert_eq!(config.storage_key, "cart-v1");
        assert_eq!(config.persist_debounce, Duration::from_millis(50));
        assert_eq!(config.free_shipping_threshold.minor_units(), 9_950);
        assert_eq!(config.flat_shipping.minor_units(), 495);
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/basket"));
    }

    #[test]
    fn test_invalid_debounce() {
        let err = load(&[("BASKET_PERSIST_DEBOUNCE_MS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "BASKET_PERSIST_DEBOUNCE_MS"));
    }

    #[test]
    fn test_invalid_price() {
        assert!(load(&[("BASKET_FLAT_SHIPPING", "ten")]).is_err());
        assert!(load(&[("BASKET_FREE_SHIPPING_THRESHOLD", "-1")]).is_err());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(load(&[("BASKET_STORAGE_KEY", "")]).is_err());
        assert!(load(&[("BASKET_STORAGE_KEY", "../cart")]).is_err());
        assert!(load(&[("BASKET_COUNT_HINT_KEY", "count; evil=1")]).is_err());
    }
}
