//! SQLite-backed encrypted key-value store.
//!
//! Several logical stores can share one database file; each is isolated by
//! its namespace. Neither keys nor values are stored in the clear:
//!
//! ```text
//! encrypted_entries(
//!     namespace  TEXT  -- store name
//!     key_id     TEXT  -- HMAC of (namespace, key), used for lookup
//!     key_blob   BLOB  -- sealed key, recovered by `all()`
//!     value_blob BLOB  -- sealed value
//! )
//! ```
//!
//! Both blobs are bound to their row through the AEAD associated data, so a
//! blob copied into another row fails to open.

use crate::base::context::StorageResultExt;
use crate::base::storeerror::StoreError;
use crate::storage::crypto::{EntryCipher, MasterKey};
use crate::storage::KeyValueStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS encrypted_entries (
    namespace TEXT NOT NULL,
    key_id TEXT NOT NULL,
    key_blob BLOB NOT NULL,
    value_blob BLOB NOT NULL,
    PRIMARY KEY (namespace, key_id)
)";

const SEPARATOR: &[u8] = &[0];

/// Durable encrypted store over a single SQLite connection.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
    namespace: String,
    cipher: EntryCipher,
}

impl SqliteKeyValueStore {
    /// Open (or create) the database at `path` and bind to `namespace`.
    pub fn open(
        path: impl AsRef<Path>,
        namespace: impl Into<String>,
        key: &MasterKey,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::storage("open", e.to_string()))?;
            }
        }

        let conn = Connection::open(path).storage_context("open")?;
        set_owner_only_permissions(path)?;
        Self::with_connection(conn, namespace.into(), key)
    }

    /// Open a private in-memory database, mainly for tests.
    pub fn open_in_memory(
        namespace: impl Into<String>,
        key: &MasterKey,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().storage_context("open")?;
        Self::with_connection(conn, namespace.into(), key)
    }

    fn with_connection(
        conn: Connection,
        namespace: String,
        key: &MasterKey,
    ) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).storage_context("open")?;
        Ok(Self {
            conn: Mutex::new(conn),
            namespace,
            cipher: EntryCipher::new(key)?,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // Each statement autocommits; a panicking holder cannot leave a
        // partial write behind.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn aad(&self, key_id: &str, part: &str) -> Vec<u8> {
        [
            self.namespace.as_bytes(),
            SEPARATOR,
            key_id.as_bytes(),
            SEPARATOR,
            part.as_bytes(),
        ]
        .concat()
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let key_id = self.cipher.key_id(&self.namespace, key)?;
        let key_blob = self.cipher.seal(key.as_bytes(), &self.aad(&key_id, "key"))?;
        let value_blob = self.cipher.seal(value.as_bytes(), &self.aad(&key_id, "value"))?;

        self.connection()
            .execute(
                "INSERT OR REPLACE INTO encrypted_entries (namespace, key_id, key_blob, value_blob)
                 VALUES (?1, ?2, ?3, ?4)",
                params![self.namespace, key_id, key_blob, value_blob],
            )
            .storage_context("put")?;

        tracing::trace!(namespace = %self.namespace, "sqlite entry written");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key_id = self.cipher.key_id(&self.namespace, key)?;
        let value_blob: Option<Vec<u8>> = self
            .connection()
            .query_row(
                "SELECT value_blob FROM encrypted_entries WHERE namespace = ?1 AND key_id = ?2",
                params![self.namespace, key_id],
                |row| row.get(0),
            )
            .optional()
            .storage_context("get")?;

        value_blob
            .map(|blob| self.cipher.open_string(&blob, &self.aad(&key_id, "value")))
            .transpose()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let key_id = self.cipher.key_id(&self.namespace, key)?;
        self.connection()
            .execute(
                "DELETE FROM encrypted_entries WHERE namespace = ?1 AND key_id = ?2",
                params![self.namespace, key_id],
            )
            .storage_context("remove")?;
        Ok(())
    }

    fn all(&self) -> Result<HashMap<String, String>, StoreError> {
        let rows: Vec<(String, Vec<u8>, Vec<u8>)> = {
            let conn = self.connection();
            let mut stmt = conn
                .prepare(
                    "SELECT key_id, key_blob, value_blob FROM encrypted_entries WHERE namespace = ?1",
                )
                .storage_context("all")?;
            let rows = stmt
                .query_map(params![self.namespace], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })
                .storage_context("all")?;
            rows.collect::<Result<_, _>>().storage_context("all")?
        };

        let mut entries = HashMap::with_capacity(rows.len());
        for (key_id, key_blob, value_blob) in rows {
            let opened = self
                .cipher
                .open_string(&key_blob, &self.aad(&key_id, "key"))
                .and_then(|key| {
                    let value = self
                        .cipher
                        .open_string(&value_blob, &self.aad(&key_id, "value"))?;
                    Ok((key, value))
                });

            match opened {
                Ok((key, value)) => {
                    entries.insert(key, value);
                }
                Err(e) => {
                    tracing::warn!(
                        namespace = %self.namespace,
                        key_id = %key_id,
                        error = %e,
                        "skipping unreadable sqlite entry"
                    );
                }
            }
        }

        Ok(entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.connection()
            .execute(
                "DELETE FROM encrypted_entries WHERE namespace = ?1",
                params![self.namespace],
            )
            .storage_context("clear")?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| StoreError::storage("open", e.to_string()))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_replace() {
        let store = SqliteKeyValueStore::open_in_memory("jar", &MasterKey::generate()).unwrap();
        store.put("https://example.com", "[1]").unwrap();
        store.put("https://example.com", "[2]").unwrap();

        assert_eq!(store.get("https://example.com").unwrap().as_deref(), Some("[2]"));
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let store = SqliteKeyValueStore::open_in_memory("jar", &MasterKey::generate()).unwrap();
        store.remove("https://nowhere.example").unwrap();
        assert!(store.get("https://nowhere.example").unwrap().is_none());
    }

    #[test]
    fn test_swapped_blob_is_skipped() {
        let store = SqliteKeyValueStore::open_in_memory("jar", &MasterKey::generate()).unwrap();
        store.put("https://a.example", "[\"a\"]").unwrap();
        store.put("https://b.example", "[\"b\"]").unwrap();

        // Copy row a's value blob into row b.
        {
            let conn = store.connection();
            let a_id = store.cipher.key_id("jar", "https://a.example").unwrap();
            let b_id = store.cipher.key_id("jar", "https://b.example").unwrap();
            conn.execute(
                "UPDATE encrypted_entries SET value_blob =
                    (SELECT value_blob FROM encrypted_entries WHERE key_id = ?1)
                 WHERE key_id = ?2",
                params![a_id, b_id],
            )
            .unwrap();
        }

        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["https://a.example"], "[\"a\"]");
        assert_eq!(
            store.get("https://b.example"),
            Err(StoreError::Decryption)
        );
    }
}
