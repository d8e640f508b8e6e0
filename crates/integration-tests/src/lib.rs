//! Integration tests for Basket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p basket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_lifecycle` - Restore, mutate, notify, and persist through the public API
//! - `debounced_persistence` - Write coalescing under paused tokio time
//! - `file_storage` - Carts surviving a reopen from a storage directory
//!
//! This crate exposes a few fixtures shared by those tests.

use std::sync::{Arc, Mutex};

use basket_cart::{
    Cart, CartAction, CartConfig, DurableStorage, ImmediatePersister, NotificationBus,
    Persistence, Persister,
};
use basket_core::{LineItem, Price, Sku};

/// Build a line item from literal parts.
///
/// # Panics
///
/// Panics if `sku` or `price` is invalid.
#[must_use]
#[allow(clippy::expect_used)]
pub fn line(sku: &str, quantity: u32, price: &str) -> LineItem {
    LineItem::new(
        Sku::parse(sku).expect("valid sku"),
        quantity,
        Price::parse(price).expect("valid price"),
    )
}

/// Actions observed on a bus, in order.
#[derive(Clone, Default)]
pub struct EventLog {
    actions: Arc<Mutex<Vec<CartAction>>>,
}

impl EventLog {
    /// Record every action published on `bus`.
    #[must_use]
    pub fn attach(bus: &NotificationBus) -> Self {
        let log = Self::default();
        let sink = log.actions.clone();
        bus.subscribe(move |event| {
            sink.lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event.action);
        });
        log
    }

    /// Actions recorded so far.
    #[must_use]
    pub fn actions(&self) -> Vec<CartAction> {
        self.actions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Open a cart over `storage` that writes synchronously.
#[must_use]
pub fn open_immediate(storage: Arc<dyn DurableStorage>, bus: NotificationBus) -> Cart {
    let config = CartConfig::default();
    let persistence = Persistence::new(storage, &config);
    let persister: Arc<dyn Persister> = Arc::new(ImmediatePersister::new(persistence.clone()));
    Cart::open(&config, &persistence, persister, bus)
}
