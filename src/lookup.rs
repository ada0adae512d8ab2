//! Concurrency-safe string association table.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A string to string map shared between threads.
///
/// Readers run concurrently; a writer holds the lock for a single map operation.
/// Empty values are never stored, `set` with an empty value removes the key.
#[derive(Debug, Default)]
pub struct Lookup {
    entries: RwLock<HashMap<String, String>>,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table seeded with the given pairs.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v): &(String, String)| !v.is_empty())
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.unset(&key);
            return;
        }
        self.write().insert(key, value);
    }

    pub fn unset(&self, key: &str) {
        self.write().remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Every critical section is a single map operation, so a poisoned map is
    // still consistent and safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(e) => {
                log::warn!("Recovering poisoned lookup read lock: {}", e);
                e.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(e) => {
                log::warn!("Recovering poisoned lookup write lock: {}", e);
                e.into_inner()
            }
        }
    }
}
