use super::*;

fn record() -> StoredSession {
    StoredSession { access_token: "A".to_owned(), refresh_token: "R".to_owned(), user: r#"{"username":"ana"}"#.to_owned() }
}

#[test]
fn write_session_sets_all_keys() {
    let storage = MemoryStorage::new();
    storage.write_session(&record()).unwrap();
    assert_eq!(storage.get(StorageKey::AccessToken).as_deref(), Some("A"));
    assert_eq!(storage.get(StorageKey::RefreshToken).as_deref(), Some("R"));
    assert_eq!(storage.get(StorageKey::User).as_deref(), Some(r#"{"username":"ana"}"#));
}

#[test]
fn clear_is_idempotent() {
    let storage = MemoryStorage::new();
    storage.write_session(&record()).unwrap();
    storage.clear().unwrap();
    storage.clear().unwrap();
    assert!(storage.is_empty());
}

#[test]
fn empty_access_token_reads_as_absent() {
    let storage = MemoryStorage::new();
    storage.insert(StorageKey::AccessToken, "");
    assert_eq!(storage.access_token(), None);
    storage.insert(StorageKey::AccessToken, "tok");
    assert_eq!(storage.access_token().as_deref(), Some("tok"));
}
