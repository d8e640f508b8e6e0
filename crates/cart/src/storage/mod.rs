//! Durable storage adapters.
//!
//! The cart reads its payload once on startup and writes full snapshots
//! afterwards. Any string key-value store can back it:
//! - [`MemoryStorage`] - In-process map, for tests and ephemeral sessions
//! - [`FileStorage`] - One file per key under a directory
//!
//! The item count hint goes through a separate [`HintSink`] so contexts that
//! cannot read the payload (a server-rendered header badge) still see it.
//! [`CookieJar`] keeps the hint in a cookie header string.

mod cookie;
mod file;
mod memory;

pub use cookie::CookieJar;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// Abstraction for durable key-value storage backends.
///
/// Implementations must make `set` atomic from a reader's point of view:
/// a concurrent `get` sees either the old value or the new one.
pub trait DurableStorage: Send + Sync {
    /// Retrieves the value stored under `key`.
    ///
    /// Returns `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the value stored under `key`.
    ///
    /// Returns Ok even if nothing is stored (idempotent operation).
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A string slot readable by other rendering contexts.
pub trait HintSink: Send + Sync {
    /// Sets `name` to `value`, replacing a previous value.
    fn set_hint(&self, name: &str, value: &str) -> Result<(), StorageError>;
}
