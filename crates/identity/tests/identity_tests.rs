use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tashreef_identity::{
    FileKeyValueStore, IdentityStore, KeyValueStore, MemoryKeyValueStore, StorageError,
    DISPLAY_NAME_KEY, TOKEN_KEY,
};

/// Storage that fails every call and counts them.
#[derive(Default)]
struct BrokenStore {
    calls: AtomicUsize,
}

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable("disabled".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable("disabled".into()))
    }
}

/// Storage that reads fine but rejects writes.
#[derive(Default)]
struct ReadOnlyStore {
    inner: MemoryKeyValueStore,
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }
}

#[test]
fn creates_and_persists_identity_on_first_access() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let store = IdentityStore::new(storage.clone());

    let identity = store.get_or_create_identity();

    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some(identity.id.as_str()));
    assert_eq!(
        storage.get(DISPLAY_NAME_KEY).unwrap().as_deref(),
        Some(identity.display_name.as_str())
    );
    let expected: String = identity.id.replace('-', "").chars().take(5).collect();
    assert_eq!(identity.display_name, format!("user-{expected}"));
    assert!(!store.is_degraded());
}

#[test]
fn repeated_resolution_is_identical() {
    let store = IdentityStore::new(Arc::new(MemoryKeyValueStore::new()));
    let first = store.get_or_create_identity();
    let second = store.get_or_create_identity();
    assert_eq!(first, second);

    // A fresh store over the same storage sees the same identity.
    let storage = Arc::new(MemoryKeyValueStore::new());
    let a = IdentityStore::new(storage.clone()).get_or_create_identity();
    let b = IdentityStore::new(storage).get_or_create_identity();
    assert_eq!(a, b);
}

#[test]
fn repairs_missing_display_name_without_new_token() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    storage
        .set(TOKEN_KEY, "a1b2c3d4-e5f6-4789-a123-abcdef012345")
        .unwrap();

    let identity = IdentityStore::new(storage.clone()).get_or_create_identity();

    assert_eq!(identity.id, "a1b2c3d4-e5f6-4789-a123-abcdef012345");
    assert_eq!(identity.display_name, "user-a1b2c");
    assert_eq!(storage.get(DISPLAY_NAME_KEY).unwrap().as_deref(), Some("user-a1b2c"));
}

#[test]
fn cleared_display_name_is_rederived_from_same_token() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let first = IdentityStore::new(storage.clone()).get_or_create_identity();

    assert_eq!(storage.remove(DISPLAY_NAME_KEY), Some(first.display_name.clone()));
    assert_eq!(storage.len(), 1);

    let second = IdentityStore::new(storage.clone()).get_or_create_identity();
    assert_eq!(second, first);
    assert_eq!(storage.len(), 2);
}

#[test]
fn empty_display_name_is_repaired() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    storage.set(TOKEN_KEY, "ffeeddcc-0000-4000-8000-000000000000").unwrap();
    storage.set(DISPLAY_NAME_KEY, "").unwrap();

    let identity = IdentityStore::new(storage.clone()).get_or_create_identity();
    assert_eq!(identity.display_name, "user-ffeed");
    assert_eq!(storage.get(DISPLAY_NAME_KEY).unwrap().as_deref(), Some("user-ffeed"));
}

#[test]
fn empty_token_counts_as_absent() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    storage.set(TOKEN_KEY, "").unwrap();

    let identity = IdentityStore::new(storage.clone()).get_or_create_identity();
    assert!(!identity.id.is_empty());
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), Some(identity.id));
}

#[test]
fn explicit_display_name_is_kept() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    storage.set(TOKEN_KEY, "a1b2c3d4-e5f6-4789-a123-abcdef012345").unwrap();
    storage.set(DISPLAY_NAME_KEY, "Amira").unwrap();

    let identity = IdentityStore::new(storage).get_or_create_identity();
    assert_eq!(identity.display_name, "Amira");
}

#[test]
fn set_display_name_persists() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let store = IdentityStore::new(storage.clone());
    let before = store.get_or_create_identity();

    let renamed = store.set_display_name("Host").unwrap();
    assert_eq!(renamed.id, before.id);
    assert_eq!(store.get_or_create_identity().display_name, "Host");
}

#[test]
fn unavailable_storage_degrades_to_stable_in_memory_identity() {
    let broken = Arc::new(BrokenStore::default());
    let store = IdentityStore::new(broken.clone());

    let first = store.get_or_create_identity();
    assert!(store.is_degraded());
    assert!(first.display_name.starts_with("user-"));

    let calls = broken.calls.load(Ordering::SeqCst);
    let second = store.get_or_create_identity();
    assert_eq!(first, second);
    assert_eq!(broken.calls.load(Ordering::SeqCst), calls);
}

#[test]
fn failed_first_write_keeps_generated_identity() {
    let store = IdentityStore::new(Arc::new(ReadOnlyStore::default()));
    let first = store.get_or_create_identity();
    assert!(store.is_degraded());
    assert_eq!(first, store.get_or_create_identity());
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let first = IdentityStore::new(Arc::new(FileKeyValueStore::new(&path))).get_or_create_identity();
    let second = IdentityStore::new(Arc::new(FileKeyValueStore::new(&path))).get_or_create_identity();

    assert_eq!(first, second);
    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw[TOKEN_KEY], first.id.as_str());
    assert_eq!(raw[DISPLAY_NAME_KEY], first.display_name.as_str());
}
