//! The cart store.
//!
//! [`Cart`] is the only owner of line-item state. It is opened once at
//! application start, restores from durable storage before anyone reads it,
//! and is then shared by cloning the handle.
//!
//! Every mutation follows the same order: update the mapping, release the
//! lock, publish a [`CartEvent`], then hand the current snapshot to the
//! [`Persister`]. The snapshot is taken after subscribers have run, so a
//! subscriber that mutates the cart again can never cause an older state to
//! be written last.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use basket_core::{LineItem, Price, Sku};
use indexmap::IndexMap;
use tracing::{debug, info, instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::events::{CartAction, CartEvent, NotificationBus, SubscriptionId};
use crate::payload::{CartPayload, PayloadError};
use crate::persist::{Persistence, Persister};

/// What happened when the cart read durable storage on open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was stored (or storage could not be read).
    Empty,
    /// A payload was restored.
    Restored {
        /// Number of distinct line items restored.
        items: usize,
    },
    /// A payload was found but could not be used, and was removed.
    Discarded {
        /// Why the payload was rejected.
        reason: String,
    },
}

/// Shipping rule: a flat charge below a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShippingPolicy {
    free_threshold: Price,
    flat: Price,
}

impl ShippingPolicy {
    fn charge(self, subtotal: Price) -> Price {
        if subtotal < self.free_threshold {
            self.flat
        } else {
            Price::ZERO
        }
    }
}

/// Handle to the cart store.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct Cart {
    shared: Arc<Shared>,
}

struct Shared {
    items: Mutex<IndexMap<Sku, LineItem>>,
    shipping: ShippingPolicy,
    bus: NotificationBus,
    persister: Arc<dyn Persister>,
    restore_outcome: OnceLock<RestoreOutcome>,
}

impl Cart {
    /// Open the cart and restore it from `persistence`.
    ///
    /// Restoring never fails: a missing, unreadable, malformed, or
    /// wrong-version payload leaves the cart empty (and unusable payloads
    /// are removed). A successful restore publishes a `restore` event, so
    /// subscribe on `bus` before opening to observe it.
    #[must_use]
    pub fn open(
        config: &CartConfig,
        persistence: &Persistence,
        persister: Arc<dyn Persister>,
        bus: NotificationBus,
    ) -> Self {
        let cart = Self {
            shared: Arc::new(Shared {
                items: Mutex::new(IndexMap::new()),
                shipping: ShippingPolicy {
                    free_threshold: config.free_shipping_threshold,
                    flat: config.flat_shipping,
                },
                bus,
                persister,
                restore_outcome: OnceLock::new(),
            }),
        };

        let outcome = cart.restore(persistence);
        let _ = cart.shared.restore_outcome.set(outcome);
        cart
    }

    #[instrument(skip_all, fields(key = %persistence.storage_key()))]
    fn restore(&self, persistence: &Persistence) -> RestoreOutcome {
        let raw = match persistence.storage().get(persistence.storage_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return RestoreOutcome::Empty,
            Err(e) => {
                warn!(error = %e, "Failed to read stored cart; starting empty");
                return RestoreOutcome::Empty;
            }
        };

        let payload = match CartPayload::decode(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                match &e {
                    PayloadError::VersionMismatch { .. } => {
                        info!(error = %e, "Discarding stored cart from another schema version");
                    }
                    PayloadError::Malformed(_) => {
                        warn!(error = %e, "Discarding unreadable stored cart");
                    }
                }
                persistence.clear_stored();
                return RestoreOutcome::Discarded {
                    reason: e.to_string(),
                };
            }
        };

        let count = {
            let mut items = self.lock_items();
            items.clear();
            for item in payload.items {
                items.insert(item.sku.clone(), item);
            }
            items.len()
        };

        debug!(items = count, "Restored cart");
        self.publish(CartAction::Restore, None);
        RestoreOutcome::Restored { items: count }
    }

    /// What happened when the cart was opened.
    #[must_use]
    pub fn restore_outcome(&self) -> &RestoreOutcome {
        self.shared
            .restore_outcome
            .get()
            .unwrap_or(&RestoreOutcome::Empty)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item, merging with an existing line for the same sku.
    ///
    /// On merge only the quantity changes; the existing line keeps its
    /// price and display metadata.
    #[instrument(skip_all, fields(sku = %item.sku, quantity = item.quantity))]
    pub fn add_item(&self, item: LineItem) {
        {
            let mut items = self.lock_items();
            match items.get_mut(&item.sku) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                    debug!(quantity = existing.quantity, "Merged into existing line");
                }
                None => {
                    items.insert(item.sku.clone(), item.clone());
                    debug!("Added new line");
                }
            }
        }

        self.publish(CartAction::Add, Some(item));
        self.schedule_persist();
    }

    /// Set the quantity of an existing line.
    ///
    /// The quantity is not checked; remove the line instead of setting it
    /// below one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has `sku`. The cart,
    /// storage, and subscribers are untouched in that case.
    #[instrument(skip(self))]
    pub fn update_item(&self, sku: &str, quantity: u32) -> Result<()> {
        let updated = {
            let mut items = self.lock_items();
            let Some(existing) = items.get_mut(sku) else {
                warn!("Update for sku not in cart");
                return Err(CartError::ItemNotFound(sku.to_string()));
            };
            existing.quantity = quantity;
            existing.clone()
        };

        self.publish(CartAction::Update, Some(updated));
        self.schedule_persist();
        Ok(())
    }

    /// Remove the line for `sku`, returning it.
    ///
    /// Publishes and persists even when the sku is not in the cart; the
    /// event then carries no item.
    #[instrument(skip(self))]
    pub fn remove_item(&self, sku: &str) -> Option<LineItem> {
        let removed = self.lock_items().shift_remove(sku);
        if removed.is_none() {
            debug!("Remove for sku not in cart");
        }

        self.publish(CartAction::Remove, removed.clone());
        self.schedule_persist();
        removed
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        self.lock_items().clear();

        self.publish(CartAction::Clear, None);
        self.schedule_persist();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Owned copy of the current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock_items().values().cloned().collect()
    }

    /// Owned copy of the line for `sku`.
    #[must_use]
    pub fn item(&self, sku: &str) -> Option<LineItem> {
        self.lock_items().get(sku).cloned()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lock_items()
            .values()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Sum of quantity times unit price across all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lock_items().values().map(LineItem::line_total).sum()
    }

    /// Shipping charged for the current subtotal.
    #[must_use]
    pub fn shipping(&self) -> Price {
        self.shared.shipping.charge(self.subtotal())
    }

    /// Subtotal plus shipping.
    #[must_use]
    pub fn total(&self) -> Price {
        let subtotal = self.subtotal();
        subtotal + self.shared.shipping.charge(subtotal)
    }

    /// Snapshot in the durable payload shape.
    #[must_use]
    pub fn to_payload(&self) -> CartPayload {
        CartPayload::new(self.items())
    }

    /// Snapshot rendered as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass-through field cannot be serialized.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        self.to_payload().encode()
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Subscribe to this cart's change events.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(subscriber)
    }

    /// Whether two handles refer to the same cart.
    #[must_use]
    pub fn same_cart(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn publish(&self, action: CartAction, item: Option<LineItem>) {
        let event = CartEvent {
            cart: self.clone(),
            action,
            item,
        };
        self.shared.bus.publish(&event);
    }

    fn schedule_persist(&self) {
        self.shared.persister.schedule(self.to_payload());
    }

    fn lock_items(&self) -> MutexGuard<'_, IndexMap<Sku, LineItem>> {
        self.shared
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("items", &self.len())
            .field("item_count", &self.item_count())
            .field("subtotal", &self.subtotal())
            .finish_non_exhaustive()
    }
}
