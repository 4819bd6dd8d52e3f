use super::*;
use crate::net::types::Role;

fn sample_session() -> PersistedSession {
    PersistedSession {
        user: Some(User { id: "u1".to_owned(), role: Role::User, ..User::default() }),
        token: Some("t1".to_owned()),
        is_authenticated: true,
    }
}

// =============================================================
// MemoryStorage
// =============================================================

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get_item("k"), None);
    storage.set_item("k", "v").unwrap();
    assert_eq!(storage.get_item("k").as_deref(), Some("v"));
    storage.remove_item("k").unwrap();
    assert_eq!(storage.get_item("k"), None);
    storage.remove_item("k").unwrap();
}

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_storage_round_trips_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path().join("state")).unwrap();
    storage.set_item(SESSION_STORAGE_KEY, "{}").unwrap();
    assert!(dir.path().join("state/auth-storage.json").exists());

    let reopened = FileStorage::open(dir.path().join("state")).unwrap();
    assert_eq!(reopened.get_item(SESSION_STORAGE_KEY).as_deref(), Some("{}"));

    reopened.remove_item(SESSION_STORAGE_KEY).unwrap();
    assert_eq!(storage.get_item(SESSION_STORAGE_KEY), None);
    reopened.remove_item(SESSION_STORAGE_KEY).unwrap();
}

#[test]
fn file_storage_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();
    assert!(matches!(storage.set_item("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(storage.set_item(".hidden", "x"), Err(StorageError::InvalidKey(_))));
    assert_eq!(storage.get_item("a/b"), None);
}

// =============================================================
// Session envelope
// =============================================================

#[test]
fn save_session_writes_versioned_camel_case_envelope() {
    let storage = MemoryStorage::new();
    save_session(&storage, &sample_session()).unwrap();
    let raw = storage.get_item(SESSION_STORAGE_KEY).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 0);
    assert_eq!(value["state"]["token"], "t1");
    assert_eq!(value["state"]["isAuthenticated"], true);
    assert_eq!(value["state"]["user"]["id"], "u1");
}

#[test]
fn load_session_reads_back_saved_state() {
    let storage = MemoryStorage::new();
    save_session(&storage, &sample_session()).unwrap();
    assert_eq!(load_session(&storage), Some(sample_session()));
    assert_eq!(stored_token(&storage).as_deref(), Some("t1"));
}

#[test]
fn corrupt_envelope_reads_as_absent() {
    let storage = MemoryStorage::new();
    storage.set_item(SESSION_STORAGE_KEY, "{not json").unwrap();
    assert_eq!(load_session(&storage), None);
    assert_eq!(stored_token(&storage), None);
}

#[test]
fn stored_token_ignores_empty_and_null_tokens() {
    let storage = MemoryStorage::new();
    storage
        .set_item(SESSION_STORAGE_KEY, r#"{"state":{"token":"","isAuthenticated":false}}"#)
        .unwrap();
    assert_eq!(stored_token(&storage), None);
    storage.set_item(SESSION_STORAGE_KEY, r#"{"state":{"token":null}}"#).unwrap();
    assert_eq!(stored_token(&storage), None);
}

#[test]
fn clear_session_removes_key() {
    let storage = MemoryStorage::new();
    save_session(&storage, &sample_session()).unwrap();
    clear_session(&storage).unwrap();
    assert_eq!(storage.get_item(SESSION_STORAGE_KEY), None);
}
