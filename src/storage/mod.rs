//! Key-value backing stores for persisted cookie buckets.
//!
//! The cookie store only needs the five operations of [`KeyValueStore`].
//! Each one must be atomic and durable by the time it returns.
//!
//! | Store | Durability | At rest |
//! |-------|------------|---------|
//! | [`MemoryKeyValueStore`](memory::MemoryKeyValueStore) | process lifetime | plaintext |
//! | [`SqliteKeyValueStore`](sqlite::SqliteKeyValueStore) | SQLite file | AES-256-GCM |

use crate::base::storeerror::StoreError;
use std::collections::HashMap;

pub mod crypto;
pub mod memory;
pub mod sqlite;

/// Encrypted key-value storage consumed by the persistent cookie store.
///
/// Implementations must be thread-safe; the cookie store serializes its own
/// mutations but reads may come from any thread.
pub trait KeyValueStore: Send + Sync {
    /// Insert or fully replace the value stored under `key`.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Snapshot of every entry at call time.
    fn all(&self) -> Result<HashMap<String, String>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}
