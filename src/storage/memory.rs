//! In-process storage, used by tests and embedders that persist elsewhere.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{SessionStorage, StorageError, StorageKey, StoredSession};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no key is currently stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Write a single entry, bypassing the one-record rule. Tests use it to
    /// stage partial or stale state.
    #[cfg(test)]
    pub(crate) fn insert(&self, key: StorageKey, value: &str) {
        self.lock().insert(key, value.to_owned());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<StorageKey, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.lock().get(&key).cloned()
    }

    fn write_session(&self, session: &StoredSession) -> Result<(), StorageError> {
        let mut entries = self.lock();
        for (key, value) in session.entries() {
            entries.insert(key, value.to_owned());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.lock().clear();
        Ok(())
    }
}
