//! Per-target lookup state.

use std::collections::HashSet;
use std::fmt;

use crate::domain::{KBucket, NodeId};

/// Handle of one lookup session.
///
/// Issued by `LookupCoordinator::start`; two lookups for the same target
/// get different handles and never share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupId(pub(crate) u64);

impl fmt::Display for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of one in-flight lookup.
#[derive(Debug, Clone)]
pub struct LookupSession {
    /// Identifier being looked up.
    pub(crate) target: NodeId,
    /// Candidates discovered so far, anchored at the lookup target.
    pub(crate) bucket: KBucket,
    /// Requested result count.
    pub(crate) count: usize,
    /// Candidates whose state has been fetched and verified.
    pub(crate) connected: HashSet<NodeId>,
    /// Candidates handed out as probes and not yet reported back.
    pub(crate) awaiting: HashSet<NodeId>,
}

impl LookupSession {
    pub(crate) fn new(
        target: NodeId,
        bucket: KBucket,
        count: usize,
        awaiting: HashSet<NodeId>,
    ) -> Self {
        Self {
            target,
            bucket,
            count,
            connected: HashSet::new(),
            awaiting,
        }
    }

    /// Identifier being looked up.
    pub fn target(&self) -> &NodeId {
        &self.target
    }

    /// Requested result count.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of probes not yet reported back.
    pub fn awaiting(&self) -> usize {
        self.awaiting.len()
    }

    /// `true` if `node_id` was verified during this lookup.
    pub fn is_connected(&self, node_id: &NodeId) -> bool {
        self.connected.contains(node_id)
    }

    /// Current closest candidates to the target.
    pub fn closest(&self) -> Vec<NodeId> {
        self.bucket.closest(&self.target, self.count)
    }
}
