//! Backend error conversions for the cookie store.

use crate::base::storeerror::StoreError;

// Conversion from rusqlite errors
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ffi::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ffi::ErrorCode::DatabaseLocked =>
            {
                StoreError::DatabaseLocked
            }
            _ => StoreError::Database {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rusqlite_conversion() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database { .. }));
    }

    #[test]
    fn test_locked_maps_to_database_locked() {
        let locked = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            None,
        );
        let err: StoreError = locked.into();
        assert_eq!(err, StoreError::DatabaseLocked);
    }
}
