//! Cookie persistence - mirror a cookie jar into an encrypted key-value store.
//!
//! [`PersistentCookieStore`] wraps a [`CookieMonster`] and keeps one
//! backing-store entry per effective URI. Every mutation updates the index
//! first, then reads the whole bucket back and writes it (or deletes it) in a
//! single backing-store call, so the persisted entry always matches what the
//! index decided to keep.
//!
//! # Example
//! ```ignore
//! use cookievault::cookies::persistence::PersistentCookieStore;
//! use cookievault::storage::memory::MemoryKeyValueStore;
//! use std::sync::Arc;
//!
//! let store = PersistentCookieStore::builder("session-jar")
//!     .backing(Arc::new(MemoryKeyValueStore::new()))
//!     .build()?;
//! store.add(&url, cookie)?;
//! ```

use crate::base::storeerror::StoreError;
use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::lockregistry::StoreLock;
use crate::cookies::monster::{effective_uri, CookieMonster, MAX_COOKIES_PER_URI};
use crate::cookies::record::{CookieCodec, PlatformCapabilities};
use crate::cookies::CookieStore;
use crate::storage::crypto::MasterKey;
use crate::storage::memory::MemoryKeyValueStore;
use crate::storage::sqlite::SqliteKeyValueStore;
use crate::storage::KeyValueStore;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Host-level configuration for a persistent cookie store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CookieStoreConfig {
    /// Store name. Also the lock scope and the SQLite namespace.
    pub name: String,
    /// SQLite database file used by [`PersistentCookieStore::open_sqlite`].
    pub database_path: Option<PathBuf>,
    pub max_cookies_per_uri: usize,
    /// Whether the runtime can report HttpOnly flags.
    pub http_only_readable: bool,
}

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            name: "cookies".to_string(),
            database_path: None,
            max_cookies_per_uri: MAX_COOKIES_PER_URI,
            http_only_readable: PlatformCapabilities::detect().http_only,
        }
    }
}

/// Builder for creating a [`PersistentCookieStore`].
pub struct PersistentCookieStoreBuilder {
    name: String,
    backing: Option<Arc<dyn KeyValueStore>>,
    capabilities: PlatformCapabilities,
    max_cookies_per_uri: usize,
}

impl PersistentCookieStoreBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backing: None,
            capabilities: PlatformCapabilities::detect(),
            max_cookies_per_uri: MAX_COOKIES_PER_URI,
        }
    }

    /// Apply the non-storage settings of a [`CookieStoreConfig`].
    pub fn config(mut self, config: &CookieStoreConfig) -> Self {
        self.name = config.name.clone();
        self.max_cookies_per_uri = config.max_cookies_per_uri;
        self.capabilities = PlatformCapabilities {
            http_only: config.http_only_readable,
        };
        self
    }

    /// Set the backing store. Defaults to a fresh in-memory store.
    pub fn backing(mut self, backing: Arc<dyn KeyValueStore>) -> Self {
        self.backing = Some(backing);
        self
    }

    pub fn capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn max_cookies_per_uri(mut self, limit: usize) -> Self {
        self.max_cookies_per_uri = limit;
        self
    }

    /// Build the store and load every readable persisted entry.
    pub fn build(self) -> Result<PersistentCookieStore, StoreError> {
        let backing = self
            .backing
            .unwrap_or_else(|| Arc::new(MemoryKeyValueStore::new()));

        let mut store = PersistentCookieStore {
            lock: StoreLock::for_name(&self.name),
            name: self.name,
            index: CookieMonster::with_limit(self.max_cookies_per_uri),
            backing,
            codec: CookieCodec::new(self.capabilities),
            load_summary: LoadSummary::default(),
        };
        let summary = store.load()?;
        store.load_summary = summary;
        Ok(store)
    }
}

/// Outcome of loading persisted entries.
///
/// `skipped` counts entries that failed to decode. Rows a backing store drops
/// while reading (such as undecryptable SQLite rows) never reach the count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// A cookie jar durably mirrored into an encrypted key-value store.
pub struct PersistentCookieStore {
    name: String,
    index: CookieMonster,
    backing: Arc<dyn KeyValueStore>,
    codec: CookieCodec,
    lock: StoreLock,
    load_summary: LoadSummary,
}

impl PersistentCookieStore {
    pub fn builder(name: impl Into<String>) -> PersistentCookieStoreBuilder {
        PersistentCookieStoreBuilder::new(name)
    }

    /// Open a store over `backing` with default settings.
    pub fn open(
        name: impl Into<String>,
        backing: Arc<dyn KeyValueStore>,
    ) -> Result<Self, StoreError> {
        Self::builder(name).backing(backing).build()
    }

    /// Open a store backed by an encrypted SQLite database.
    ///
    /// Without `database_path` the database lives in memory.
    pub fn open_sqlite(config: &CookieStoreConfig, key: &MasterKey) -> Result<Self, StoreError> {
        let backing: Arc<dyn KeyValueStore> = match &config.database_path {
            Some(path) => Arc::new(SqliteKeyValueStore::open(path, config.name.clone(), key)?),
            None => Arc::new(SqliteKeyValueStore::open_in_memory(config.name.clone(), key)?),
        };
        Self::builder(config.name.clone())
            .config(config)
            .backing(backing)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.codec.capabilities()
    }

    /// Entries loaded and skipped when this store was built.
    pub fn load_summary(&self) -> LoadSummary {
        self.load_summary
    }

    /// Rebuild the index from every persisted entry.
    ///
    /// Entries that fail to decode are logged and skipped. Only a failure of
    /// the backing store itself is returned.
    fn load(&self) -> Result<LoadSummary, StoreError> {
        let _guard = self.lock.acquire();

        let mut summary = LoadSummary::default();
        for (key, encoded) in self.backing.all()? {
            match self.decode_entry(&key, &encoded) {
                Ok((uri, cookies)) => {
                    self.index.restore_bucket(uri, cookies);
                    summary.loaded += 1;
                }
                Err(e) if !e.is_decode_error() => return Err(e),
                Err(e) => {
                    tracing::error!(
                        store = %self.name,
                        key = %key,
                        error = %e,
                        "skipping unreadable persisted cookie entry"
                    );
                    summary.skipped += 1;
                }
            }
        }

        tracing::debug!(
            store = %self.name,
            loaded = summary.loaded,
            skipped = summary.skipped,
            "cookie store loaded"
        );
        Ok(summary)
    }

    fn decode_entry(
        &self,
        key: &str,
        encoded: &str,
    ) -> Result<(String, Vec<CanonicalCookie>), StoreError> {
        let url = Url::parse(key).map_err(|_| StoreError::invalid_entry_key(key))?;
        let uri = effective_uri(&url)
            .filter(|uri| uri == key)
            .ok_or_else(|| StoreError::invalid_entry_key(key))?;
        let cookies = self.codec.decode(encoded)?;
        Ok((uri, cookies))
    }

    /// Write the current bucket for `uri`, or delete its entry if the bucket
    /// is gone. Exactly one backing-store call.
    fn persist_bucket(&self, uri: &str) -> Result<(), StoreError> {
        match self.index.cookies_for(uri) {
            Some(cookies) => {
                let encoded = self.codec.encode(&cookies)?;
                self.backing.put(uri, &encoded)?;
                tracing::debug!(
                    store = %self.name,
                    uri = %uri,
                    count = cookies.len(),
                    "persisted cookie bucket"
                );
            }
            None => {
                self.backing.remove(uri)?;
                tracing::debug!(store = %self.name, uri = %uri, "deleted cookie bucket");
            }
        }
        Ok(())
    }

    /// Add a cookie and persist the resulting bucket.
    ///
    /// URLs without an effective URI are a no-op for persistence.
    pub fn add(&self, url: &Url, cookie: CanonicalCookie) -> Result<(), StoreError> {
        let _guard = self.lock.acquire();

        self.index.add(url, cookie);
        let Some(uri) = effective_uri(url) else {
            return Ok(());
        };
        self.persist_bucket(&uri)
    }

    /// Remove a cookie and persist (or delete) the resulting bucket.
    ///
    /// Returns whether the index held the cookie. The bucket is rewritten
    /// even when nothing was removed.
    pub fn remove(&self, url: &Url, cookie: &CanonicalCookie) -> Result<bool, StoreError> {
        let _guard = self.lock.acquire();

        let Some(uri) = effective_uri(url) else {
            return Ok(false);
        };
        let removed = self.index.remove(url, cookie);
        self.persist_bucket(&uri)?;
        Ok(removed)
    }

    /// Clear the index and the whole backing store. Always `Ok(true)` when
    /// the backing store accepted the clear.
    pub fn remove_all(&self) -> Result<bool, StoreError> {
        let _guard = self.lock.acquire();

        self.index.remove_all();
        self.backing.clear()?;
        tracing::debug!(store = %self.name, "cleared cookie store");
        Ok(true)
    }

    /// Cookies matching `url`. Lock-free.
    pub fn get(&self, url: &Url) -> Vec<CanonicalCookie> {
        self.index.get(url)
    }

    pub fn cookies(&self) -> Vec<CanonicalCookie> {
        self.index.cookies()
    }

    pub fn urls(&self) -> Vec<String> {
        self.index.urls()
    }

    pub fn cookies_for(&self, effective_uri: &str) -> Option<Vec<CanonicalCookie>> {
        self.index.cookies_for(effective_uri)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl CookieStore for PersistentCookieStore {
    fn add(&self, url: &Url, cookie: CanonicalCookie) -> Result<(), StoreError> {
        PersistentCookieStore::add(self, url, cookie)
    }

    fn get(&self, url: &Url) -> Vec<CanonicalCookie> {
        PersistentCookieStore::get(self, url)
    }

    fn cookies(&self) -> Vec<CanonicalCookie> {
        PersistentCookieStore::cookies(self)
    }

    fn urls(&self) -> Vec<String> {
        PersistentCookieStore::urls(self)
    }

    fn remove(&self, url: &Url, cookie: &CanonicalCookie) -> Result<bool, StoreError> {
        PersistentCookieStore::remove(self, url, cookie)
    }

    fn remove_all(&self) -> Result<bool, StoreError> {
        PersistentCookieStore::remove_all(self)
    }
}
