//! Basket Cart - The storefront cart state manager.
//!
//! [`Cart`] owns the shopper's line items for the lifetime of a page
//! session. It restores from durable storage when opened, derives item
//! count, subtotal, and shipping on every read, publishes a [`CartEvent`]
//! after each mutation, and hands full snapshots to a [`Persister`] that
//! writes them (debounced) to a [`DurableStorage`] adapter.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use basket_cart::{
//!     Cart, CartConfig, ImmediatePersister, MemoryStorage, NotificationBus, Persistence,
//! };
//! use basket_core::{LineItem, Price, Sku};
//!
//! let config = CartConfig::default();
//! let persistence = Persistence::new(Arc::new(MemoryStorage::new()), &config);
//! let persister = Arc::new(ImmediatePersister::new(persistence.clone()));
//! let cart = Cart::open(&config, &persistence, persister, NotificationBus::new());
//!
//! let sku = Sku::parse("TEE-BLK-M").unwrap();
//! cart.add_item(LineItem::new(sku, 2, Price::parse("19.99").unwrap()));
//!
//! assert_eq!(cart.item_count(), 2);
//! assert_eq!(cart.subtotal().to_string(), "$39.98");
//! assert_eq!(cart.shipping().to_string(), "$10.00");
//! ```
//!
//! # Modules
//!
//! - [`store`] - The cart itself
//! - [`events`] - Change notifications and the notification bus
//! - [`persist`] - Immediate and debounced persistence scheduling
//! - [`storage`] - Durable storage and count hint adapters
//! - [`payload`] - Versioned durable payload
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod persist;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError};
pub use error::{CartError, StorageError};
pub use events::{CART_CHANGE_EVENT, CartAction, CartEvent, NotificationBus, SubscriptionId};
pub use payload::{CartPayload, PayloadError, SCHEMA_VERSION};
pub use persist::{DebouncedPersister, ImmediatePersister, Persistence, Persister};
pub use storage::{CookieJar, DurableStorage, FileStorage, HintSink, MemoryStorage};
pub use store::{Cart, RestoreOutcome};
