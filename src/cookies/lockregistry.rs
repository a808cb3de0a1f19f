//! Process-wide mutation locks keyed by store name.
//!
//! Every [`PersistentCookieStore`](crate::cookies::persistence::PersistentCookieStore)
//! opened under the same name shares one lock, so index updates and their
//! persisted writes never interleave across instances. Stores with different
//! names do not contend.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static STORE_LOCKS: Lazy<DashMap<String, Arc<Mutex<()>>>> = Lazy::new(DashMap::new);

/// Shared lock handle for a store name.
#[derive(Clone, Debug)]
pub struct StoreLock {
    inner: Arc<Mutex<()>>,
}

impl StoreLock {
    /// Look up (or create) the lock registered for `name`.
    pub fn for_name(name: &str) -> Self {
        let inner = STORE_LOCKS
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { inner }
    }

    /// Enter the critical section.
    ///
    /// The guarded value is `()`; a panic in another holder leaves nothing
    /// half-written here, so poisoning is cleared.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn same_lock(&self, other: &StoreLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
