//! Bounded FIFO of committed state snapshots.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::domain::{PeerTable, StateVersion};

/// Committed state snapshots keyed by version, evicted oldest-first.
///
/// Reads use `peek`, so the LRU order never changes after insertion and
/// eviction order is insertion order.
pub struct StateHistory {
    entries: LruCache<StateVersion, Arc<PeerTable>>,
}

impl StateHistory {
    /// Create a history holding at most `capacity` snapshots (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Record a snapshot unless its version is already present.
    ///
    /// Returns `true` if it was inserted.
    pub fn commit(&mut self, version: &StateVersion, state: &Arc<PeerTable>) -> bool {
        if self.entries.contains(version) {
            return false;
        }
        self.entries.put(version.clone(), Arc::clone(state));
        true
    }

    /// Snapshot recorded under `version`, if still retained.
    pub fn get(&self, version: &StateVersion) -> Option<&Arc<PeerTable>> {
        self.entries.peek(version)
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no snapshot is retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
