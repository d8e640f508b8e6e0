//! Change notifications.
//!
//! Every cart mutation publishes a [`CartEvent`] on a [`NotificationBus`].
//! Subscribers run synchronously, in registration order, inside the
//! mutating call. The bus holds no lock while a subscriber runs, so a
//! subscriber may subscribe, unsubscribe, or mutate the cart again.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use basket_core::LineItem;
use serde::Serialize;

use crate::store::Cart;

/// Name UI layers use for cart change events.
pub const CART_CHANGE_EVENT: &str = "cart:change";

/// What kind of mutation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Restore,
    Add,
    Update,
    Remove,
    Clear,
}

impl CartAction {
    /// Wire tag of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for CartAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cart change.
#[derive(Debug, Clone)]
pub struct CartEvent {
    /// Handle to the cart that changed.
    pub cart: Cart,
    /// Mutation that produced the event.
    pub action: CartAction,
    /// Item affected by the mutation, when there is one.
    ///
    /// For `add` this is the item as passed by the caller; for `update` the
    /// item after the change; for `remove` the removed item (`None` if the
    /// sku was not in the cart).
    pub item: Option<LineItem>,
}

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&CartEvent) + Send + Sync>;

/// Process-wide publish/subscribe channel for cart events.
///
/// Cheap to clone; clones share the subscriber list.
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
}

impl NotificationBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver `event` to every subscriber registered at the time of the call.
    pub fn publish(&self, event: &CartEvent) {
        let subscribers: Vec<Subscriber> = self
            .lock()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        for subscriber in subscribers {
            subscriber(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Subscriber)>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
