use thiserror::Error;

/// Errors raised by the cookie store and its backing key-value stores.
///
/// Decode errors (`InvalidEntryKey`, `InvalidEntry`, `Serialization`) are
/// recovered locally while loading; everything else propagates to the caller.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    // Decode Errors
    #[error("Invalid persisted entry key: {key}")]
    InvalidEntryKey { key: String },
    #[error("Invalid persisted entry: {reason}")]
    InvalidEntry { reason: String },
    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    // Backing Store Errors
    #[error("Backing store {operation} failed: {message}")]
    Storage { operation: String, message: String },
    #[error("Cookie database error: {message}")]
    Database { message: String },
    #[error("Cookie database is locked")]
    DatabaseLocked,

    // Crypto Errors
    #[error("Invalid master key: {reason}")]
    InvalidKey { reason: String },
    #[error("Encryption failed")]
    Encryption,
    #[error("Decryption failed")]
    Decryption,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl StoreError {
    pub fn invalid_entry_key(key: impl Into<String>) -> Self {
        StoreError::InvalidEntryKey { key: key.into() }
    }

    pub fn invalid_entry(reason: impl Into<String>) -> Self {
        StoreError::InvalidEntry {
            reason: reason.into(),
        }
    }

    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn invalid_key(reason: impl Into<String>) -> Self {
        StoreError::InvalidKey {
            reason: reason.into(),
        }
    }

    /// True for errors caused by unreadable persisted data rather than by the
    /// backing store itself.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidEntryKey { .. }
                | StoreError::InvalidEntry { .. }
                | StoreError::Serialization { .. }
                | StoreError::Decryption
        )
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            StoreError::InvalidEntryKey { .. } => -310,
            StoreError::InvalidEntry { .. } => -311,
            StoreError::Serialization { .. } => -312,
            StoreError::Storage { .. } => -400,
            StoreError::Database { .. } => -401,
            StoreError::DatabaseLocked => -402,
            StoreError::InvalidKey { .. } => -500,
            StoreError::Encryption => -501,
            StoreError::Decryption => -502,
            StoreError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for StoreError {
    fn from(code: i32) -> Self {
        match code {
            -310 => StoreError::InvalidEntryKey { key: String::new() },
            -311 => StoreError::InvalidEntry {
                reason: String::new(),
            },
            -312 => StoreError::Serialization {
                message: String::new(),
            },
            -400 => StoreError::Storage {
                operation: String::new(),
                message: String::new(),
            },
            -401 => StoreError::Database {
                message: String::new(),
            },
            -402 => StoreError::DatabaseLocked,
            -500 => StoreError::InvalidKey {
                reason: String::new(),
            },
            -501 => StoreError::Encryption,
            -502 => StoreError::Decryption,
            _ => StoreError::Unknown(code),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}
