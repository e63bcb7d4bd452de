//! In-memory value store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::ports::ValueStore;

/// `ValueStore` backed by a `HashMap`. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryValueStore {
    values: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl ValueStore for MemoryValueStore {
    fn has(&self, key: &[u8]) -> bool {
        self.values.read().contains_key(key)
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: Vec<u8>, value: Vec<u8>) {
        self.values.write().insert(key, value);
    }
}
