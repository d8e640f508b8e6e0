//! Persistence scheduling.
//!
//! The cart never writes to storage itself. After each mutation it hands
//! the full current snapshot to a [`Persister`], which decides when the
//! write happens:
//! - [`ImmediatePersister`] writes synchronously on every signal
//! - [`DebouncedPersister`] runs a tokio task that writes only after a quiet
//!   period; a new signal restarts the timer and replaces the pending
//!   snapshot, so a burst of mutations produces a single write of the final
//!   state
//!
//! Writes are best effort. A failing adapter is logged and the in-memory
//! cart is unaffected. The debounced writer runs adapter calls on tokio's
//! blocking pool.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::config::CartConfig;
use crate::payload::CartPayload;
use crate::storage::{DurableStorage, HintSink};

/// Receives "state dirty" signals from the cart.
pub trait Persister: Send + Sync {
    /// Schedule `snapshot` to be written.
    fn schedule(&self, snapshot: CartPayload);
}

/// Storage handles and keys used to write a snapshot.
#[derive(Clone)]
pub struct Persistence {
    storage: Arc<dyn DurableStorage>,
    hint: Option<Arc<dyn HintSink>>,
    storage_key: String,
    hint_key: String,
}

impl Persistence {
    /// Persist to `storage` using the keys from `config`.
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>, config: &CartConfig) -> Self {
        Self {
            storage,
            hint: None,
            storage_key: config.storage_key.clone(),
            hint_key: config.count_hint_key.clone(),
        }
    }

    /// Mirror the item count into `hint` on every write.
    #[must_use]
    pub fn with_hint(mut self, hint: Arc<dyn HintSink>) -> Self {
        self.hint = Some(hint);
        self
    }

    /// The durable storage adapter.
    #[must_use]
    pub fn storage(&self) -> &dyn DurableStorage {
        self.storage.as_ref()
    }

    /// Key the payload is stored under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Write `snapshot` and its count hint.
    pub fn write(&self, snapshot: &CartPayload) {
        let count = snapshot.item_count();

        if let Some(hint) = &self.hint {
            if let Err(e) = hint.set_hint(&self.hint_key, &count.to_string()) {
                warn!(error = %e, key = %self.hint_key, "Failed to write cart count hint");
            }
        }

        let encoded = match snapshot.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode cart payload");
                return;
            }
        };

        match self.storage.set(&self.storage_key, &encoded) {
            Ok(()) => debug!(
                key = %self.storage_key,
                items = snapshot.items.len(),
                count,
                "Persisted cart"
            ),
            Err(e) => warn!(error = %e, key = %self.storage_key, "Failed to persist cart"),
        }
    }

    /// Drop whatever is stored under the payload key.
    pub fn clear_stored(&self) {
        if let Err(e) = self.storage.remove(&self.storage_key) {
            warn!(error = %e, key = %self.storage_key, "Failed to clear stored cart");
        }
    }
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistence")
            .field("storage_key", &self.storage_key)
            .field("hint_key", &self.hint_key)
            .field("hint", &self.hint.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Immediate
// =============================================================================

/// Writes every snapshot as soon as it is scheduled.
#[derive(Debug, Clone)]
pub struct ImmediatePersister {
    persistence: Persistence,
}

impl ImmediatePersister {
    #[must_use]
    pub const fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }
}

impl Persister for ImmediatePersister {
    fn schedule(&self, snapshot: CartPayload) {
        self.persistence.write(&snapshot);
    }
}

// =============================================================================
// Debounced
// =============================================================================

enum Command {
    Dirty(CartPayload),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Coalesces bursts of snapshots into one write after a quiet period.
///
/// The writer task stops after [`shutdown`](Self::shutdown) or once every
/// handle is dropped; either way a pending snapshot is written first.
#[derive(Debug, Clone)]
pub struct DebouncedPersister {
    tx: mpsc::UnboundedSender<Command>,
}

impl DebouncedPersister {
    /// Spawn the writer task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(persistence: Persistence, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(rx, persistence, delay));
        Self { tx }
    }

    /// Write the pending snapshot now, if there is one.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Write the pending snapshot and stop the writer task.
    ///
    /// Later signals are dropped.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

impl Persister for DebouncedPersister {
    fn schedule(&self, snapshot: CartPayload) {
        if self.tx.send(Command::Dirty(snapshot)).is_err() {
            debug!("Cart writer stopped; dropping snapshot");
        }
    }
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<Command>,
    persistence: Persistence,
    delay: Duration,
) {
    let mut pending: Option<CartPayload> = None;

    loop {
        let command = match pending.take() {
            Some(snapshot) => tokio::select! {
                command = rx.recv() => {
                    pending = Some(snapshot);
                    command
                }
                () = tokio::time::sleep(delay) => {
                    write_blocking(&persistence, snapshot).await;
                    continue;
                }
            },
            None => rx.recv().await,
        };

        match command {
            Some(Command::Dirty(snapshot)) => pending = Some(snapshot),
            Some(Command::Flush(ack)) => {
                if let Some(snapshot) = pending.take() {
                    write_blocking(&persistence, snapshot).await;
                }
                let _ = ack.send(());
            }
            Some(Command::Shutdown(ack)) => {
                if let Some(snapshot) = pending.take() {
                    write_blocking(&persistence, snapshot).await;
                }
                let _ = ack.send(());
                break;
            }
            None => {
                if let Some(snapshot) = pending.take() {
                    write_blocking(&persistence, snapshot).await;
                }
                break;
            }
        }
    }

    debug!("Cart writer stopped");
}

/// Storage adapters do synchronous I/O, so writes run on the blocking pool.
async fn write_blocking(persistence: &Persistence, snapshot: CartPayload) {
    let persistence = persistence.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || persistence.write(&snapshot)).await {
        warn!(error = %e, "Cart write task failed");
    }
}
