//! Encrypted SQLite backing store tests.

use cookievault::storage::crypto::MasterKey;
use cookievault::storage::sqlite::SqliteKeyValueStore;
use cookievault::storage::KeyValueStore;
use tempfile::tempdir;

#[test]
fn test_entries_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jar.db");
    let key = MasterKey::generate();

    {
        let store = SqliteKeyValueStore::open(&path, "jar", &key).unwrap();
        store.put("https://example.com", r#"[{"name":"sid"}]"#).unwrap();
        store.put("https://other.example", "[]").unwrap();
        store.remove("https://other.example").unwrap();
    }

    let store = SqliteKeyValueStore::open(&path, "jar", &key).unwrap();
    let all = store.all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all["https://example.com"], r#"[{"name":"sid"}]"#);
}

#[test]
fn test_file_holds_no_plaintext() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jar.db");
    let store = SqliteKeyValueStore::open(&path, "jar", &MasterKey::generate()).unwrap();
    store
        .put("https://tracking.example", r#"[{"name":"visitor_id"}]"#)
        .unwrap();
    drop(store);

    let bytes = std::fs::read(&path).unwrap();
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(!haystack.contains("tracking.example"));
    assert!(!haystack.contains("visitor_id"));
}

#[test]
fn test_wrong_key_rows_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jar.db");
    let key = MasterKey::generate();
    SqliteKeyValueStore::open(&path, "jar", &key)
        .unwrap()
        .put("https://example.com", "[]")
        .unwrap();

    let other = SqliteKeyValueStore::open(&path, "jar", &MasterKey::generate()).unwrap();
    assert!(other.all().unwrap().is_empty());
    // Lookup ids differ under another key, so the row is simply not found.
    assert_eq!(other.get("https://example.com").unwrap(), None);
}

#[test]
fn test_namespaces_are_isolated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let key = MasterKey::generate();
    let work = SqliteKeyValueStore::open(&path, "work", &key).unwrap();
    let personal = SqliteKeyValueStore::open(&path, "personal", &key).unwrap();

    work.put("https://example.com", "[\"work\"]").unwrap();
    personal.put("https://example.com", "[\"personal\"]").unwrap();

    assert_eq!(
        work.get("https://example.com").unwrap().as_deref(),
        Some("[\"work\"]")
    );

    personal.clear().unwrap();
    assert!(personal.all().unwrap().is_empty());
    assert_eq!(work.all().unwrap().len(), 1);
}

#[test]
fn test_key_roundtrips_through_base64() {
    let key = MasterKey::generate();
    let encoded = key.to_base64();
    let restored = MasterKey::from_base64(&encoded).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("jar.db");
    SqliteKeyValueStore::open(&path, "jar", &key)
        .unwrap()
        .put("https://example.com", "[]")
        .unwrap();

    let store = SqliteKeyValueStore::open(&path, "jar", &restored).unwrap();
    assert_eq!(store.get("https://example.com").unwrap().as_deref(), Some("[]"));
}

#[cfg(unix)]
#[test]
fn test_database_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("jar.db");
    let _store = SqliteKeyValueStore::open(&path, "jar", &MasterKey::generate()).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
