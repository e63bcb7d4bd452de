//! Lookup state machine with the anti-Sybil fan-out cap.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::session::{LookupId, LookupSession};
use crate::domain::{KBucket, LookupItem, NodeId, PeerStateModel, StateVersion};

/// Who vouched for a second-hop candidate, and under which version.
type Parents = HashMap<NodeId, (NodeId, StateVersion)>;

/// Tracks every in-flight lookup of one node.
///
/// Sessions are keyed by the handle `start` returns, so concurrent lookups
/// of the same target stay independent.
#[derive(Debug, Clone)]
pub struct LookupCoordinator {
    fraction: f64,
    default_count: usize,
    next_id: u64,
    sessions: HashMap<LookupId, LookupSession>,
}

impl LookupCoordinator {
    /// `fraction` is the anti-Sybil share; `default_count` the lookup width
    /// used when a caller does not ask for one.
    pub fn new(fraction: f64, default_count: usize) -> Self {
        Self {
            fraction,
            default_count,
            next_id: 0,
            sessions: HashMap::new(),
        }
    }

    /// Session behind `lookup`, if still open.
    pub fn session(&self, lookup: &LookupId) -> Option<&LookupSession> {
        self.sessions.get(lookup)
    }

    /// Number of open sessions.
    pub fn active(&self) -> usize {
        self.sessions.len()
    }

    /// Open a lookup for `target`; returns its handle and the first round
    /// of probes.
    ///
    /// A target that is already a direct peer needs no probes. A target
    /// some peer vouches for is probed directly through that peer. Every
    /// call opens a session that must be closed with [`finish`](Self::finish).
    pub fn start(
        &mut self,
        model: &PeerStateModel,
        target: &NodeId,
        count: Option<usize>,
    ) -> (LookupId, Vec<LookupItem>) {
        let count = count.unwrap_or(self.default_count);
        let lookup = LookupId(self.next_id);
        self.next_id += 1;

        if model.has_peer(target) {
            debug!(%lookup, %target, "Lookup target is a direct peer");
            let bucket = KBucket::new(target.clone(), count);
            self.open(lookup, target, bucket, count, HashSet::new());
            return (lookup, Vec::new());
        }

        let (mut bucket, parents) = seed(model, target, count);

        if let Some((parent_id, parent_version)) = parents.get(target) {
            debug!(%lookup, %target, parent = %parent_id, "Lookup target vouched for by a peer");
            let item = LookupItem {
                node_id: target.clone(),
                parent_id: parent_id.clone(),
                parent_version: parent_version.clone(),
            };
            self.open(lookup, target, bucket, count, HashSet::from([target.clone()]));
            return (lookup, vec![item]);
        }

        let max_fraction = match model.peer_count() {
            0 => 1.0,
            peers => self.fraction.max(1.0 / peers as f64),
        };

        let items = loop {
            let closest = bucket.closest(target, count);
            let cap = (closest.len() as f64 * max_fraction).ceil() as usize;
            let mut per_origin: HashMap<&NodeId, usize> = HashMap::new();
            let mut items = Vec::new();
            let mut evicted = Vec::new();

            for candidate in &closest {
                let parent = parents.get(candidate);
                let origin = parent.map_or(candidate, |(parent_id, _)| parent_id);
                let seen = per_origin.entry(origin).or_insert(0);
                *seen += 1;
                if *seen > cap {
                    trace!(candidate = %candidate, origin = %origin, "Over per-peer cap");
                    evicted.push(candidate.clone());
                    continue;
                }
                if let Some((parent_id, parent_version)) = parent {
                    items.push(LookupItem {
                        node_id: candidate.clone(),
                        parent_id: parent_id.clone(),
                        parent_version: parent_version.clone(),
                    });
                }
            }

            if evicted.is_empty() {
                break items;
            }
            for candidate in &evicted {
                bucket.remove(candidate);
            }
        };

        debug!(
            %lookup,
            %target,
            count,
            candidates = bucket.len(),
            probes = items.len(),
            "Started lookup"
        );
        let awaiting = items.iter().map(|item| item.node_id.clone()).collect();
        self.open(lookup, target, bucket, count, awaiting);
        (lookup, items)
    }

    fn open(
        &mut self,
        lookup: LookupId,
        target: &NodeId,
        bucket: KBucket,
        count: usize,
        awaiting: HashSet<NodeId>,
    ) {
        self.sessions.insert(
            lookup,
            LookupSession::new(target.clone(), bucket, count, awaiting),
        );
    }

    /// Fold the result of probing `node_id` into the session `lookup`.
    ///
    /// `node_state` is the verified `(version, neighbours)` of the probed
    /// node, or `None` if the probe failed; a failed node is dropped from
    /// the candidates. Returns the next probes, all vouched for by
    /// `node_id`.
    pub fn update(
        &mut self,
        own_id: &NodeId,
        lookup: &LookupId,
        node_id: &NodeId,
        node_state: Option<(&StateVersion, &[NodeId])>,
    ) -> Vec<LookupItem> {
        let Some(session) = self.sessions.get_mut(lookup) else {
            return Vec::new();
        };
        let target = &session.target;
        session.awaiting.remove(node_id);

        let Some((version, neighbors)) = node_state else {
            trace!(%target, node = %node_id, "Probe failed, dropping candidate");
            session.bucket.remove(node_id);
            return Vec::new();
        };
        session.connected.insert(node_id.clone());

        let mut added = HashSet::new();
        for neighbor in neighbors {
            if neighbor != own_id && session.bucket.insert(neighbor.clone()) {
                added.insert(neighbor);
            }
        }

        let item = |candidate: &NodeId| LookupItem {
            node_id: candidate.clone(),
            parent_id: node_id.clone(),
            parent_version: version.clone(),
        };

        if session.connected.contains(target) {
            return Vec::new();
        }
        if session.bucket.has(target) {
            if session.awaiting.contains(target) {
                return Vec::new();
            }
            session.awaiting.insert(target.clone());
            return vec![item(target)];
        }

        let items: Vec<LookupItem> = session
            .bucket
            .closest(target, session.count)
            .iter()
            .filter(|candidate| added.contains(candidate))
            .map(item)
            .collect();
        for next in &items {
            session.awaiting.insert(next.node_id.clone());
        }
        trace!(
            %target,
            node = %node_id,
            added = added.len(),
            probes = items.len(),
            "Folded probe result"
        );
        items
    }

    /// Close the session `lookup`.
    ///
    /// `[target]` if the target is a direct peer or was reached during the
    /// lookup, otherwise the closest candidates found. `None` if `lookup`
    /// is not open.
    pub fn finish(&mut self, model: &PeerStateModel, lookup: &LookupId) -> Option<Vec<NodeId>> {
        let session = self.sessions.remove(lookup)?;
        let target = &session.target;
        if model.has_peer(target) || session.connected.contains(target) {
            debug!(%lookup, %target, "Lookup reached target");
            return Some(vec![target.clone()]);
        }
        let closest = session.closest();
        debug!(%lookup, %target, found = closest.len(), "Lookup finished without exact hit");
        Some(closest)
    }
}

/// Candidate trie for `target` plus the parent of every second-hop entry.
///
/// Direct peers go in first so a peer that some other peer also lists is
/// never attributed to that other peer. Our own id is never a candidate.
fn seed(model: &PeerStateModel, target: &NodeId, count: usize) -> (KBucket, Parents) {
    let own_id = model.id();
    let state = model.state();
    let mut bucket = KBucket::new(target.clone(), count);
    let mut parents = Parents::new();

    for peer_id in state.keys() {
        bucket.insert(peer_id.clone());
    }
    for (peer_id, entry) in state {
        for neighbor in &entry.neighbors {
            if neighbor == own_id || parents.contains_key(neighbor) {
                continue;
            }
            if bucket.insert(neighbor.clone()) {
                parents.insert(
                    neighbor.clone(),
                    (peer_id.clone(), entry.version.clone()),
                );
            }
        }
    }
    (bucket, parents)
}
