//! Process-local key-value store.

use crate::base::storeerror::StoreError;
use crate::storage::KeyValueStore;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Thread-safe in-memory store.
///
/// Clones share the same entries, which lets several cookie stores (or a test
/// and the store under test) observe one "physical" backing store.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn all(&self) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = MemoryKeyValueStore::new();
        store.put("https://example.com", "[]").unwrap();
        assert_eq!(store.get("https://example.com").unwrap().as_deref(), Some("[]"));

        store.put("https://example.com", "[1]").unwrap();
        assert_eq!(store.len(), 1);

        store.remove("https://example.com").unwrap();
        store.remove("https://example.com").unwrap();
        assert!(store.get("https://example.com").unwrap().is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryKeyValueStore::new();
        let view = store.clone();
        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();

        let all = view.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["b"], "2");

        view.clear().unwrap();
        assert!(store.is_empty());
    }
}
