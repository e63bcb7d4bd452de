//! Peer table, state version and proofs.

use std::sync::Arc;

use shared_crypto::HashFunction;
use tracing::{debug, trace};

use super::history::StateHistory;
use crate::domain::{
    check_state_proof, compute_proof, compute_root, is_valid_proof_shape, DhtError, KBucket,
    NodeId, PeerClaimError, PeerEntry, PeerTable, Proof, StateSnapshot, StateVersion,
};

/// A node's accepted peers and the Merkle commitment over them.
pub struct PeerStateModel {
    id: NodeId,
    hasher: Arc<dyn HashFunction>,
    peers: KBucket,
    state: Arc<PeerTable>,
    version: StateVersion,
    history: StateHistory,
}

impl PeerStateModel {
    /// Empty model owned by `id`.
    pub fn new(
        id: NodeId,
        hasher: Arc<dyn HashFunction>,
        bucket_size: usize,
        state_history_size: usize,
    ) -> Self {
        let state = Arc::new(PeerTable::new());
        let version = state_version(&id, &state, hasher.as_ref());
        Self {
            peers: KBucket::new(id.clone(), bucket_size),
            id,
            hasher,
            state,
            version,
            history: StateHistory::new(state_history_size),
        }
    }

    /// Own identifier.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Current state version.
    pub fn version(&self) -> &StateVersion {
        &self.version
    }

    /// Current peer table.
    pub fn state(&self) -> &PeerTable {
        &self.state
    }

    /// Injected hash function.
    pub fn hasher(&self) -> &dyn HashFunction {
        self.hasher.as_ref()
    }

    /// Ids held in the routing trie.
    pub fn peers(&self) -> Vec<NodeId> {
        self.peers.ids()
    }

    /// Number of direct peers.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// `true` if `peer_id` is a direct peer.
    pub fn has_peer(&self, peer_id: &NodeId) -> bool {
        self.peers.has(peer_id)
    }

    /// Stored entry of a direct peer.
    pub fn peer_entry(&self, peer_id: &NodeId) -> Option<&PeerEntry> {
        self.state.get(peer_id)
    }

    /// Committed snapshots currently retained.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Validate a peer's claim that `proof` proves its self-pair under
    /// `version`, with `neighbors` as the peers that version commits to.
    pub fn verify_peer_claim(
        &self,
        peer_id: &NodeId,
        version: &StateVersion,
        proof: &Proof,
        neighbors: &[NodeId],
    ) -> Result<(), PeerClaimError> {
        if peer_id == &self.id {
            return Err(PeerClaimError::OwnIdentifier);
        }
        if peer_id.len() != self.id.len() {
            return Err(PeerClaimError::IdentifierLength {
                expected: self.id.len(),
                actual: peer_id.len(),
            });
        }
        let hasher = self.hasher.as_ref();
        if !is_valid_proof_shape(proof.as_bytes(), peer_id.as_bytes(), neighbors.len(), hasher) {
            return Err(PeerClaimError::ProofShape {
                blocks: proof.len() / (peer_id.len() + 1),
                leaves: neighbors.len() * 2 + 2,
            });
        }
        match check_state_proof(version.as_bytes(), proof.as_bytes(), peer_id.as_bytes(), hasher)
        {
            Some(detected) if detected == peer_id.as_bytes() => Ok(()),
            _ => Err(PeerClaimError::ProofMismatch),
        }
    }

    /// Accept a peer's state claim.
    ///
    /// Returns `false` only if the claim fails validation. A valid claim for
    /// a peer that is already known, or that finds no room in the trie,
    /// still returns `true` without changing the state; use
    /// [`has_peer`](Self::has_peer) to confirm membership.
    pub fn set_peer(
        &mut self,
        peer_id: NodeId,
        version: StateVersion,
        proof: &Proof,
        neighbors: Vec<NodeId>,
    ) -> bool {
        if let Err(reason) = self.verify_peer_claim(&peer_id, &version, proof, &neighbors) {
            debug!(peer = %peer_id, %reason, "Rejected peer state claim");
            return false;
        }
        if !self.peers.insert(peer_id.clone()) {
            trace!(peer = %peer_id, "Peer known or trie full, state unchanged");
            return true;
        }
        Arc::make_mut(&mut self.state).insert(peer_id, PeerEntry { version, neighbors });
        self.refresh_version();
        true
    }

    /// Drop a peer from the trie and the state. Returns `false` if unknown.
    pub fn delete_peer(&mut self, peer_id: &NodeId) -> bool {
        if !self.state.contains_key(peer_id) {
            return false;
        }
        self.peers.remove(peer_id);
        Arc::make_mut(&mut self.state).remove(peer_id);
        self.refresh_version();
        true
    }

    /// Version, self-proof and peer ids of the current state, or of a
    /// committed one.
    pub fn get_state(&self, version: Option<&StateVersion>) -> Result<StateSnapshot, DhtError> {
        let version = version.unwrap_or(&self.version);
        let state = self
            .resolve(version)
            .ok_or_else(|| DhtError::StateNotFound(version.clone()))?;
        Ok(StateSnapshot {
            version: version.clone(),
            proof: self.proof_in(state, &self.id),
            peers: state.keys().cloned().collect(),
        })
    }

    /// Proof that `peer_id` is in the state identified by `version`.
    ///
    /// Empty if that state does not contain `peer_id` and it is not our own
    /// id.
    pub fn get_state_proof(
        &self,
        version: &StateVersion,
        peer_id: &NodeId,
    ) -> Result<Proof, DhtError> {
        let state = self
            .resolve(version)
            .ok_or_else(|| DhtError::StateNotFound(version.clone()))?;
        if peer_id != &self.id && !state.contains_key(peer_id) {
            return Ok(Proof::empty());
        }
        Ok(self.proof_in(state, peer_id))
    }

    /// Keep the current state answerable after it changes.
    ///
    /// Call after sharing the current version with anyone.
    pub fn commit_state(&mut self) {
        if self.history.commit(&self.version, &self.state) {
            trace!(version = %self.version, "Committed state");
        }
    }

    fn resolve(&self, version: &StateVersion) -> Option<&PeerTable> {
        if version == &self.version {
            Some(self.state.as_ref())
        } else {
            self.history.get(version).map(|state| state.as_ref())
        }
    }

    fn proof_in(&self, state: &PeerTable, target: &NodeId) -> Proof {
        let leaves = proof_leaves(&self.id, state);
        Proof::new(compute_proof(&leaves, target.as_bytes(), self.hasher.as_ref()))
    }

    fn refresh_version(&mut self) {
        self.version = state_version(&self.id, &self.state, self.hasher.as_ref());
        debug!(version = %self.version, peers = self.state.len(), "State version changed");
    }
}

/// `[peer, version]` for each entry in id order, then `[own, own]`.
fn proof_leaves<'a>(own: &'a NodeId, state: &'a PeerTable) -> Vec<&'a [u8]> {
    let mut leaves = Vec::with_capacity(state.len() * 2 + 2);
    for (peer_id, entry) in state {
        leaves.push(peer_id.as_bytes());
        leaves.push(entry.version.as_bytes());
    }
    leaves.push(own.as_bytes());
    leaves.push(own.as_bytes());
    leaves
}

fn state_version(own: &NodeId, state: &PeerTable, hasher: &dyn HashFunction) -> StateVersion {
    StateVersion::new(compute_root(&proof_leaves(own, state), hasher))
}
