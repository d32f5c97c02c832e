use std::collections::HashMap;

use parking_lot::Mutex;

use crate::traits::{KeyValueStore, StorageError};

/// In-memory storage. Not durable; used when no storage file is configured and in tests.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.inner.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
