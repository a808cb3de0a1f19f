//! Cookie storage and persistence.
//!
//! This module provides a persistent cookie jar:
//!
//! - **Storage**: In-memory cookie index ([`CookieMonster`](monster::CookieMonster))
//!   bucketed by effective URI
//! - **Codec**: Schema-tolerant cookie records ([`record`])
//! - **Persistence**: Mirror the index into an encrypted key-value store
//!   ([`PersistentCookieStore`](persistence::PersistentCookieStore))
//! - **Locking**: Per-name critical sections shared across store instances
//!   ([`lockregistry`])
//!
//! # Architecture
//!
//! | Chromium (C++) | cookievault (Rust) | Responsibility |
//! |----------------|--------------------|----------------|
//! | `net::CookieMonster` | [`CookieMonster`](monster::CookieMonster) | Cookie jar with LRU eviction |
//! | `net::CanonicalCookie` | [`CanonicalCookie`](canonicalcookie::CanonicalCookie) | Single cookie representation |
//! | `SQLitePersistentCookieStore` | [`persistence`] | Disk persistence |
//!
//! Both the bare index and the persistent store implement [`CookieStore`], so
//! persistence can be added without changing callers.
//!
//! # Example
//!
//! ```rust,no_run
//! use cookievault::cookies::canonicalcookie::CanonicalCookie;
//! use cookievault::cookies::persistence::{CookieStoreConfig, PersistentCookieStore};
//! use cookievault::storage::crypto::MasterKey;
//! use url::Url;
//!
//! let config = CookieStoreConfig {
//!     name: "default".into(),
//!     database_path: Some("cookies.db".into()),
//!     ..Default::default()
//! };
//! let key = MasterKey::generate();
//! let jar = PersistentCookieStore::open_sqlite(&config, &key)?;
//!
//! let url = Url::parse("https://example.com/")?;
//! let now = time::OffsetDateTime::now_utc();
//! jar.add(&url, CanonicalCookie::new("sid", "abc", "example.com", "/", now, None))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::base::storeerror::StoreError;
use url::Url;

pub mod canonicalcookie;
pub mod error;
pub mod lockregistry;
pub mod monster;
pub mod persistence;
pub mod record;

use canonicalcookie::CanonicalCookie;

/// Common cookie-jar contract shared by the in-memory index and the
/// persistent store.
pub trait CookieStore: Send + Sync {
    /// Add `cookie` to the bucket of `url`, replacing any cookie with the
    /// same identity.
    fn add(&self, url: &Url, cookie: CanonicalCookie) -> Result<(), StoreError>;

    /// Unexpired cookies that apply to `url`.
    fn get(&self, url: &Url) -> Vec<CanonicalCookie>;

    fn cookies(&self) -> Vec<CanonicalCookie>;

    /// Effective URIs holding at least one cookie.
    fn urls(&self) -> Vec<String>;

    fn remove(&self, url: &Url, cookie: &CanonicalCookie) -> Result<bool, StoreError>;

    fn remove_all(&self) -> Result<bool, StoreError>;
}

impl CookieStore for monster::CookieMonster {
    fn add(&self, url: &Url, cookie: CanonicalCookie) -> Result<(), StoreError> {
        monster::CookieMonster::add(self, url, cookie);
        Ok(())
    }

    fn get(&self, url: &Url) -> Vec<CanonicalCookie> {
        monster::CookieMonster::get(self, url)
    }

    fn cookies(&self) -> Vec<CanonicalCookie> {
        monster::CookieMonster::cookies(self)
    }

    fn urls(&self) -> Vec<String> {
        monster::CookieMonster::urls(self)
    }

    fn remove(&self, url: &Url, cookie: &CanonicalCookie) -> Result<bool, StoreError> {
        Ok(monster::CookieMonster::remove(self, url, cookie))
    }

    fn remove_all(&self) -> Result<bool, StoreError> {
        Ok(monster::CookieMonster::remove_all(self))
    }
}
