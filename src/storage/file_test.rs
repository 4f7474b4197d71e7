use super::*;

fn record(access: &str) -> StoredSession {
    StoredSession {
        access_token: access.to_owned(),
        refresh_token: "refresh".to_owned(),
        user: r#"{"username":"ana","user_type":"farm_user"}"#.to_owned(),
    }
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("session.json"));
    assert_eq!(storage.get(StorageKey::AccessToken), None);
}

#[test]
fn write_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    FileStorage::new(&path).write_session(&record("A")).unwrap();

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get(StorageKey::AccessToken).as_deref(), Some("A"));
    assert_eq!(reopened.get(StorageKey::RefreshToken).as_deref(), Some("refresh"));
    assert_eq!(reopened.get(StorageKey::User).as_deref(), Some(r#"{"username":"ana","user_type":"farm_user"}"#));
}

#[test]
fn file_uses_browser_key_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    FileStorage::new(&path).write_session(&record("A")).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["access_token"], "A");
    assert_eq!(raw["refresh_token"], "refresh");
    assert!(raw["user"].is_string());
}

#[test]
fn write_session_replaces_whole_record() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("session.json"));
    storage.write_session(&record("A")).unwrap();
    let next = StoredSession { access_token: "B".to_owned(), refresh_token: "R2".to_owned(), user: r#"{"username":"bo"}"#.to_owned() };
    storage.write_session(&next).unwrap();
    assert_eq!(storage.get(StorageKey::AccessToken).as_deref(), Some("B"));
    assert_eq!(storage.get(StorageKey::RefreshToken).as_deref(), Some("R2"));
    assert_eq!(storage.get(StorageKey::User).as_deref(), Some(r#"{"username":"bo"}"#));
}

#[test]
fn clear_removes_file_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let storage = FileStorage::new(&path);
    storage.write_session(&record("A")).unwrap();
    storage.clear().unwrap();
    assert!(!path.exists());
    storage.clear().unwrap();
    for key in StorageKey::ALL {
        assert_eq!(storage.get(key), None);
    }
}

#[test]
fn corrupt_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{not json").unwrap();
    let storage = FileStorage::new(&path);
    assert_eq!(storage.get(StorageKey::User), None);
    storage.write_session(&record("C")).unwrap();
    assert_eq!(storage.get(StorageKey::AccessToken).as_deref(), Some("C"));
}

#[cfg(unix)]
#[test]
fn session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    FileStorage::new(&path).write_session(&record("A")).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
