//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting SQLite errors into context-rich `StoreError` variants.

use crate::base::storeerror::StoreError;

/// Extension trait for adding backing-store context to SQLite Results.
pub trait StorageResultExt<T> {
    /// Tag a SQLite error with the backing-store operation that raised it.
    ///
    /// # Example
    /// ```ignore
    /// use cookievault::base::context::StorageResultExt;
    ///
    /// conn.execute("DELETE FROM encrypted_entries", [])
    ///     .storage_context("clear")?;
    /// // Error: "Backing store clear failed: disk I/O error"
    /// ```
    fn storage_context(self, operation: &str) -> Result<T, StoreError>;
}

impl<T> StorageResultExt<T> for Result<T, rusqlite::Error> {
    fn storage_context(self, operation: &str) -> Result<T, StoreError> {
        self.map_err(|e| match StoreError::from(e) {
            StoreError::Database { message } => StoreError::storage(operation, message),
            other => other,
        })
    }
}
