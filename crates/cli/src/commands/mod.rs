//! CLI commands.
//!
//! Each process run is one page session: open the cart from the storage
//! directory (restoring it), apply a single command, and close the session
//! so the debounced write lands before exit.

mod cart;

use std::sync::Arc;

use basket_cart::{
    CART_CHANGE_EVENT, Cart, CartConfig, CartError, DebouncedPersister, FileStorage,
    NotificationBus, Persistence, RestoreOutcome, StorageError,
};
use basket_core::{PriceError, SkuError};
use thiserror::Error;
use tracing::{debug, info};

pub use cart::{AddArgs, add, clear, remove, show, update};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The sku argument is not a valid sku.
    #[error("Invalid sku: {0}")]
    InvalidSku(#[from] SkuError),

    /// The price argument is not a valid price.
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// An `--extra` argument is not `key=value`.
    #[error("Invalid extra field {0:?}: expected key=value")]
    InvalidExtra(String),

    /// The cart rejected the operation.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The storage directory could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be rendered as JSON.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An open cart backed by the storage directory.
pub struct Session {
    pub cart: Cart,
    persister: Arc<DebouncedPersister>,
}

impl Session {
    /// Open the storage directory and restore the cart from it.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created.
    pub fn open(config: &CartConfig) -> Result<Self, CommandError> {
        let storage = Arc::new(FileStorage::open(&config.storage_dir)?);
        debug!(dir = %storage.dir().display(), "Opened cart storage");

        let persistence = Persistence::new(storage.clone(), config).with_hint(storage);
        let persister = Arc::new(DebouncedPersister::spawn(
            persistence.clone(),
            config.persist_debounce,
        ));

        let bus = NotificationBus::new();
        bus.subscribe(|event| {
            info!(
                event = CART_CHANGE_EVENT,
                action = %event.action,
                sku = event.item.as_ref().map_or("-", |item| item.sku.as_str()),
                item_count = event.cart.item_count(),
                "Cart changed"
            );
        });

        let cart = Cart::open(config, &persistence, persister.clone(), bus);
        if let RestoreOutcome::Discarded { reason } = cart.restore_outcome() {
            info!(%reason, "Started with an empty cart");
        }

        Ok(Self { cart, persister })
    }

    /// Write any pending snapshot and stop the writer.
    pub async fn close(self) {
        self.persister.shutdown().await;
    }
}
