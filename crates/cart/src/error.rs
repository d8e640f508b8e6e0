//! Error types for the cart.
//!
//! Only caller contract violations surface as [`CartError`]. Storage and
//! payload problems are recovered from inside the cart and logged; their
//! types are public so adapters and diagnostics can name them.

use thiserror::Error;

/// Errors returned by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The caller referenced a line item that is not in the cart.
    #[error("Item with sku {0} not found")]
    ItemNotFound(String),
}

/// Errors raised by durable storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be mapped onto the backing store.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The backing store refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::ItemNotFound("TEE-01".to_string());
        assert_eq!(err.to_string(), "Item with sku TEE-01 not found");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::InvalidKey("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid storage key: \"../etc\"");

        let err = StorageError::Unavailable("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Storage unavailable: quota exceeded");
    }
}
