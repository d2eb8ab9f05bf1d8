use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{DocumentStore, StorageError, StorageKey};

/// Volatile store used for ephemeral runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<StorageKey, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document as if it had been written by an earlier run.
    pub fn with(self, key: StorageKey, document: Value) -> Self {
        self.lock().insert(key, document);
        self
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        self.lock().contains_key(&key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<StorageKey, Value>> {
        // A poisoned map still holds complete documents.
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        Ok(self.lock().get(&key).cloned())
    }

    fn save(&self, key: StorageKey, document: &Value) -> Result<(), StorageError> {
        self.lock().insert(key, document.clone());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        self.lock().remove(&key);
        Ok(())
    }
}
