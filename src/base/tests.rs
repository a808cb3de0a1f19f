use crate::base::storeerror::StoreError;

#[test]
fn test_store_error_roundtrip() {
    let original = StoreError::DatabaseLocked;
    let code = original.as_i32();
    assert_eq!(code, -402);
    let converted = StoreError::from(code);
    assert!(matches!(converted, StoreError::DatabaseLocked));

    let decode = StoreError::invalid_entry("not an array");
    assert!(matches!(
        StoreError::from(decode.as_i32()),
        StoreError::InvalidEntry { .. }
    ));
}

#[test]
fn test_unknown_error() {
    let err = StoreError::from(-9999);
    assert!(matches!(err, StoreError::Unknown(-9999)));
}

#[test]
fn test_decode_errors_are_classified() {
    assert!(StoreError::invalid_entry_key("not a url").is_decode_error());
    assert!(StoreError::Decryption.is_decode_error());
    assert!(!StoreError::storage("put", "disk full").is_decode_error());
    assert!(!StoreError::DatabaseLocked.is_decode_error());
}

#[test]
fn test_display_includes_operation() {
    let err = StoreError::storage("remove", "disk full");
    assert_eq!(err.to_string(), "Backing store remove failed: disk full");
}
