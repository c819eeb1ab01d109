//! Generic keyed registry.
//!
//! Backs the process, stage and event tables. Entries are keyed by an
//! explicit string and stored as `Arc<T>`, so trait objects and plain values
//! share the same storage.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use lifeline_protocols::ManagerError;

/// Thread-safe keyed registry.
///
/// # Type Parameters
///
/// * `T` - The stored type (e.g., `dyn ProcessInput<String>`, `Stage`)
pub struct BaseRegistry<T: ?Sized> {
    kind: &'static str,
    items: DashMap<String, Arc<T>>,
}

impl<T: ?Sized> BaseRegistry<T> {
    /// Create an empty registry. `kind` names the entries in error messages.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: DashMap::new(),
        }
    }

    /// Register an item under `key`.
    ///
    /// Returns an error if the key is already taken. The check and the
    /// insert happen under the same shard lock.
    pub fn register(&self, key: &str, item: Arc<T>) -> Result<(), ManagerError> {
        match self.items.entry(key.to_string()) {
            Entry::Occupied(_) => Err(ManagerError::already_exists(self.kind, key)),
            Entry::Vacant(slot) => {
                slot.insert(item);
                Ok(())
            }
        }
    }

    /// Insert or replace an item, returning the previous one.
    pub fn upsert(&self, key: &str, item: Arc<T>) -> Option<Arc<T>> {
        self.items.insert(key.to_string(), item)
    }

    /// Unregister an item by key.
    ///
    /// Returns an error if no item with the given key exists.
    pub fn unregister(&self, key: &str) -> Result<Arc<T>, ManagerError> {
        self.items
            .remove(key)
            .map(|(_, item)| item)
            .ok_or_else(|| ManagerError::not_found(self.kind, key))
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.items.get(key).map(|item| item.clone())
    }

    /// Like [`get`](Self::get) but reports a missing key as an error.
    pub fn require(&self, key: &str) -> Result<Arc<T>, ManagerError> {
        self.get(key)
            .ok_or_else(|| ManagerError::not_found(self.kind, key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Any one entry, used when no preferred entry exists.
    pub fn any(&self) -> Option<(String, Arc<T>)> {
        self.items
            .iter()
            .next()
            .map(|e| (e.key().clone(), e.value().clone()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}
