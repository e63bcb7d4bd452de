//! The `Dht` aggregate: one node's peer state plus its open lookups.
//!
//! Synchronous and single-owner. Concurrent callers must serialize access
//! (the service layer wraps it in a mutex).

use std::sync::Arc;

use shared_crypto::HashFunction;
use tracing::info;

use crate::domain::{
    check_state_proof, DhtConfig, DhtError, LookupCoordinator, LookupId, LookupItem,
    LookupSession, NodeId, PeerEntry, PeerStateModel, Proof, StateSnapshot, StateVersion,
};

/// DHT core of a single node.
pub struct Dht {
    model: PeerStateModel,
    lookups: LookupCoordinator,
    config: DhtConfig,
}

impl Dht {
    /// Create a node with identifier `id`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` does not validate
    /// - `EmptyIdentifier` for a zero-length id
    /// - `HashLengthMismatch` if `hasher` output is not as wide as `id`
    pub fn new(
        id: NodeId,
        hasher: Arc<dyn HashFunction>,
        config: DhtConfig,
    ) -> Result<Self, DhtError> {
        config.validate()?;
        if id.is_empty() {
            return Err(DhtError::EmptyIdentifier);
        }
        if hasher.output_len() != id.len() {
            return Err(DhtError::HashLengthMismatch {
                hash_len: hasher.output_len(),
                id_len: id.len(),
            });
        }
        info!(node = %id, k = config.bucket_size, "Created DHT");
        Ok(Self {
            model: PeerStateModel::new(
                id,
                hasher,
                config.bucket_size,
                config.state_history_size,
            ),
            lookups: LookupCoordinator::new(
                config.fraction_of_nodes_from_same_peer,
                config.bucket_size,
            ),
            config,
        })
    }

    /// Own identifier.
    pub fn id(&self) -> &NodeId {
        self.model.id()
    }

    /// Active configuration.
    pub fn config(&self) -> &DhtConfig {
        &self.config
    }

    /// Current state version.
    pub fn state_version(&self) -> &StateVersion {
        self.model.version()
    }

    /// Direct peers.
    pub fn peers(&self) -> Vec<NodeId> {
        self.model.peers()
    }

    /// Stored entry for a direct peer.
    pub fn peer_entry(&self, peer_id: &NodeId) -> Option<&PeerEntry> {
        self.model.peer_entry(peer_id)
    }

    /// Injected hash function.
    pub fn hasher(&self) -> &dyn HashFunction {
        self.model.hasher()
    }

    /// Read access to the peer-state model.
    pub fn model(&self) -> &PeerStateModel {
        &self.model
    }

    /// Open a lookup; see [`LookupCoordinator::start`].
    ///
    /// `count` defaults to the bucket size.
    pub fn start_lookup(
        &mut self,
        target: &NodeId,
        count: Option<usize>,
    ) -> (LookupId, Vec<LookupItem>) {
        self.lookups.start(&self.model, target, count)
    }

    /// Fold a probe result; see [`LookupCoordinator::update`].
    pub fn update_lookup(
        &mut self,
        lookup: &LookupId,
        node_id: &NodeId,
        node_state: Option<(&StateVersion, &[NodeId])>,
    ) -> Vec<LookupItem> {
        self.lookups
            .update(self.model.id(), lookup, node_id, node_state)
    }

    /// Close a lookup; see [`LookupCoordinator::finish`].
    pub fn finish_lookup(&mut self, lookup: &LookupId) -> Option<Vec<NodeId>> {
        self.lookups.finish(&self.model, lookup)
    }

    /// Open lookup session behind `lookup`.
    pub fn lookup_session(&self, lookup: &LookupId) -> Option<&LookupSession> {
        self.lookups.session(lookup)
    }

    /// Number of open lookups.
    pub fn active_lookups(&self) -> usize {
        self.lookups.active()
    }

    /// Accept a peer's state claim; see [`PeerStateModel::set_peer`].
    pub fn set_peer(
        &mut self,
        peer_id: NodeId,
        version: StateVersion,
        proof: &Proof,
        neighbors: Vec<NodeId>,
    ) -> bool {
        self.model.set_peer(peer_id, version, proof, neighbors)
    }

    /// `true` if `peer_id` is in the routing trie.
    pub fn has_peer(&self, peer_id: &NodeId) -> bool {
        self.model.has_peer(peer_id)
    }

    /// Forget a peer.
    pub fn delete_peer(&mut self, peer_id: &NodeId) -> bool {
        self.model.delete_peer(peer_id)
    }

    /// Current or committed state with its self-proof.
    pub fn get_state(&self, version: Option<&StateVersion>) -> Result<StateSnapshot, DhtError> {
        self.model.get_state(version)
    }

    /// Proof of `peer_id` in the state identified by `version`.
    pub fn get_state_proof(
        &self,
        version: &StateVersion,
        peer_id: &NodeId,
    ) -> Result<Proof, DhtError> {
        self.model.get_state_proof(version, peer_id)
    }

    /// Verify `proof` of `node_id` under `state_version` and return the
    /// leaf paired with it: a peer's version, or `node_id` for a self-proof.
    pub fn check_state_proof(
        &self,
        state_version: &StateVersion,
        proof: &Proof,
        node_id: &NodeId,
    ) -> Option<Vec<u8>> {
        check_state_proof(
            state_version.as_bytes(),
            proof.as_bytes(),
            node_id.as_bytes(),
            self.model.hasher(),
        )
    }

    /// Keep the current state answerable; call after sharing it.
    pub fn commit_state(&mut self) {
        self.model.commit_state();
    }
}
