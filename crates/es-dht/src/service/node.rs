//! DHT node service.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use shared_crypto::HashFunction;
use tracing::{debug, info, warn};

use crate::domain::{
    Dht, DhtConfig, DhtError, LookupId, LookupItem, NodeId, Proof, StateSnapshot, StateVersion,
    TransportError,
};
use crate::ports::{
    ConfigProvider, DhtApi, PeerTransport, Request, RequestHandler, Response, ValueStore,
};

fn violation(peer: &NodeId, reason: impl Into<String>) -> DhtError {
    DhtError::ProtocolViolation {
        peer: peer.clone(),
        reason: reason.into(),
    }
}

/// A DHT node: the core state machine plus transport and storage.
///
/// The core is guarded by a mutex that is never held across an `.await`,
/// so requests from other nodes are served while a lookup is in flight.
pub struct DhtNode<T: PeerTransport, S: ValueStore> {
    id: NodeId,
    dht: Mutex<Dht>,
    hasher: Arc<dyn HashFunction>,
    transport: Arc<T>,
    store: Arc<S>,
    bootstrap_nodes: Vec<NodeId>,
}

impl<T: PeerTransport, S: ValueStore> DhtNode<T, S> {
    /// Create a node.
    ///
    /// # Errors
    ///
    /// Whatever [`Dht::new`] rejects.
    pub fn new(
        id: NodeId,
        hasher: Arc<dyn HashFunction>,
        config: DhtConfig,
        transport: Arc<T>,
        store: Arc<S>,
    ) -> Result<Self, DhtError> {
        let dht = Dht::new(id.clone(), Arc::clone(&hasher), config)?;
        Ok(Self {
            id,
            dht: Mutex::new(dht),
            hasher,
            transport,
            store,
            bootstrap_nodes: Vec::new(),
        })
    }

    /// Create a node whose tunables and seeds come from `provider`.
    ///
    /// The seeds are used by [`join`](Self::join).
    ///
    /// # Errors
    ///
    /// Whatever [`Dht::new`] rejects.
    pub fn from_provider(
        id: NodeId,
        hasher: Arc<dyn HashFunction>,
        provider: &dyn ConfigProvider,
        transport: Arc<T>,
        store: Arc<S>,
    ) -> Result<Self, DhtError> {
        let mut node = Self::new(id, hasher, provider.dht_config(), transport, store)?;
        node.bootstrap_nodes = provider.bootstrap_nodes();
        Ok(node)
    }

    /// Configured seeds.
    pub fn bootstrap_nodes(&self) -> &[NodeId] {
        &self.bootstrap_nodes
    }

    /// Bootstrap through every configured seed; returns how many accepted.
    ///
    /// An unreachable seed is logged and skipped. Our own id is never used
    /// as a seed.
    pub async fn join(&self) -> Result<usize, DhtError> {
        let mut accepted = 0;
        for seed in self.bootstrap_nodes.iter().filter(|seed| **seed != self.id) {
            match self.bootstrap(seed).await {
                Ok(true) => accepted += 1,
                Ok(false) => {}
                Err(DhtError::Transport(err)) => {
                    warn!(node = %self.id, %seed, %err, "Seed unavailable");
                }
                Err(err) => return Err(err),
            }
        }
        info!(node = %self.id, seeds = self.bootstrap_nodes.len(), accepted, "Joined");
        Ok(accepted)
    }

    /// Own identifier.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Run `f` with exclusive access to the core.
    pub fn with_dht<R>(&self, f: impl FnOnce(&mut Dht) -> R) -> R {
        f(&mut self.dht.lock())
    }

    /// Current state version.
    pub fn state_version(&self) -> StateVersion {
        self.dht.lock().state_version().clone()
    }

    /// Direct peers.
    pub fn peers(&self) -> Vec<NodeId> {
        self.dht.lock().peers()
    }

    /// `true` if `peer` is a direct peer.
    pub fn has_peer(&self, peer: &NodeId) -> bool {
        self.dht.lock().has_peer(peer)
    }

    /// Forget a direct peer.
    pub fn delete_peer(&self, peer: &NodeId) -> bool {
        self.dht.lock().delete_peer(peer)
    }

    /// Current state, committed so peers can still query it later.
    fn share_state(&self) -> Result<StateSnapshot, DhtError> {
        let mut dht = self.dht.lock();
        let snapshot = dht.get_state(None)?;
        dht.commit_state();
        Ok(snapshot)
    }

    /// Join the network through `seed`.
    ///
    /// Sends our state; if the seed accepts us it answers with its own,
    /// which we then accept in turn. Returns whether we now hold the seed's
    /// state.
    pub async fn bootstrap(&self, seed: &NodeId) -> Result<bool, DhtError> {
        let snapshot = self.share_state()?;
        let response = self
            .transport
            .send(seed, &self.id, Request::Bootstrap(snapshot))
            .await?;
        match response {
            Response::State(Some(state)) => {
                let accepted =
                    self.dht
                        .lock()
                        .set_peer(seed.clone(), state.version, &state.proof, state.peers);
                if accepted {
                    info!(node = %self.id, %seed, "Bootstrapped");
                } else {
                    warn!(node = %self.id, %seed, "Seed answered with an invalid state");
                }
                Ok(accepted)
            }
            Response::State(None) => {
                debug!(node = %self.id, %seed, "Seed refused bootstrap");
                Ok(false)
            }
            _ => Err(TransportError::UnexpectedResponse("bootstrap").into()),
        }
    }

    /// Push our current state to `peer`.
    pub async fn announce(&self, peer: &NodeId) -> Result<(), DhtError> {
        let snapshot = self.share_state()?;
        match self
            .transport
            .send(peer, &self.id, Request::PutState(snapshot))
            .await?
        {
            Response::Ack => Ok(()),
            _ => Err(TransportError::UnexpectedResponse("put_state").into()),
        }
    }

    /// Fetch `peer`'s current state and replace what we hold for it.
    ///
    /// Returns `false` if the peer's answer does not verify; the old entry
    /// is kept in that case.
    pub async fn refresh_peer(&self, peer: &NodeId) -> Result<bool, DhtError> {
        let response = self
            .transport
            .send(peer, &self.id, Request::GetState(None))
            .await?;
        let state = match response {
            Response::State(Some(state)) => state,
            Response::State(None) => return Ok(false),
            _ => return Err(TransportError::UnexpectedResponse("get_state").into()),
        };

        let mut dht = self.dht.lock();
        if let Err(reason) =
            dht.model()
                .verify_peer_claim(peer, &state.version, &state.proof, &state.peers)
        {
            warn!(node = %self.id, %peer, %reason, "Refresh rejected");
            return Ok(false);
        }
        dht.delete_peer(peer);
        Ok(dht.set_peer(peer.clone(), state.version, &state.proof, state.peers)
            && dht.has_peer(peer))
    }

    /// Find `target`, or the nodes closest to it.
    ///
    /// Probes of one round run concurrently; the next round starts once all
    /// of them are folded back. A peer that cannot back up its claims
    /// aborts the lookup with `ProtocolViolation`.
    pub async fn lookup(&self, target: &NodeId) -> Result<Vec<NodeId>, DhtError> {
        let (lookup, mut pending) = self.dht.lock().start_lookup(target, None);
        let mut round = 0usize;

        while !pending.is_empty() {
            round += 1;
            debug!(node = %self.id, %lookup, %target, round, probes = pending.len(), "Lookup round");
            let results = join_all(pending.iter().map(|item| self.probe(&lookup, item))).await;

            let mut next = Vec::new();
            for result in results {
                match result {
                    Ok(items) => next.extend(items),
                    Err(err) => {
                        self.dht.lock().finish_lookup(&lookup);
                        warn!(node = %self.id, %lookup, %target, %err, "Lookup aborted");
                        return Err(err);
                    }
                }
            }
            pending = next;
        }

        let found = self.dht.lock().finish_lookup(&lookup).unwrap_or_default();
        debug!(node = %self.id, %lookup, %target, rounds = round, found = found.len(), "Lookup done");
        Ok(found)
    }

    /// Verify one candidate and fold the result into the lookup.
    async fn probe(&self, lookup: &LookupId, item: &LookupItem) -> Result<Vec<LookupItem>, DhtError> {
        let state = match self.fetch_vouched_state(item).await {
            Ok(state) => Some(state),
            Err(DhtError::Transport(err)) => {
                debug!(node = %item.node_id, %err, "Probe failed");
                None
            }
            Err(err) => return Err(err),
        };

        let mut dht = self.dht.lock();
        let items = match &state {
            Some(state) => dht.update_lookup(
                lookup,
                &item.node_id,
                Some((&state.version, state.peers.as_slice())),
            ),
            None => dht.update_lookup(lookup, &item.node_id, None),
        };
        Ok(items)
    }

    /// Ask the parent to prove the candidate's version, then ask the
    /// candidate for exactly that state.
    async fn fetch_vouched_state(&self, item: &LookupItem) -> Result<StateSnapshot, DhtError> {
        let request = Request::GetStateProof {
            target: item.node_id.clone(),
            version: item.parent_version.clone(),
        };
        let proof = match self.transport.send(&item.parent_id, &self.id, request).await? {
            Response::Proof(proof) => proof,
            _ => return Err(TransportError::UnexpectedResponse("get_state_proof").into()),
        };
        let version = self
            .dht
            .lock()
            .check_state_proof(&item.parent_version, &proof, &item.node_id)
            .map(StateVersion::from)
            .ok_or_else(|| violation(&item.parent_id, "relay proof does not verify"))?;

        let request = Request::GetState(Some(version.clone()));
        let state = match self.transport.send(&item.node_id, &self.id, request).await? {
            Response::State(Some(state)) => state,
            Response::State(None) => {
                return Err(violation(&item.node_id, "vouched state is unknown to its owner"))
            }
            _ => return Err(TransportError::UnexpectedResponse("get_state").into()),
        };
        if state.version != version {
            return Err(violation(&item.node_id, "answered with a different version"));
        }
        self.dht
            .lock()
            .model()
            .verify_peer_claim(&item.node_id, &state.version, &state.proof, &state.peers)
            .map_err(|reason| violation(&item.node_id, reason.to_string()))?;
        Ok(state)
    }

    /// Store `value` locally and on the nodes closest to its hash.
    pub async fn put(&self, value: Vec<u8>) -> Result<Vec<u8>, DhtError> {
        let key = self.hasher.hash(&value);
        self.store.set(key.clone(), value.clone());

        let holders = self.lookup(&NodeId::new(key.clone())).await?;
        let sends = holders.iter().map(|holder| {
            self.transport
                .send(holder, &self.id, Request::Put(value.clone()))
        });
        let stored = join_all(sends)
            .await
            .into_iter()
            .filter(|result| matches!(result, Ok(Response::Ack)))
            .count();
        debug!(node = %self.id, key = %hex::encode(&key), holders = holders.len(), stored, "Put");
        Ok(key)
    }

    /// Value stored under `key`, from the local store or the closest nodes.
    ///
    /// Values whose hash does not match `key` are ignored.
    pub async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DhtError> {
        if let Some(value) = self.store.get(key) {
            return Ok(Some(value));
        }
        let holders = self.lookup(&NodeId::new(key.to_vec())).await?;
        for holder in &holders {
            match self
                .transport
                .send(holder, &self.id, Request::Get(key.to_vec()))
                .await
            {
                Ok(Response::Value(Some(value))) if self.hasher.hash(&value) == key => {
                    return Ok(Some(value))
                }
                Ok(Response::Value(Some(_))) => {
                    warn!(node = %self.id, %holder, "Holder returned a value for another key")
                }
                Ok(_) => {}
                Err(err) => debug!(node = %self.id, %holder, %err, "Get failed"),
            }
        }
        Ok(None)
    }
}

impl<T: PeerTransport, S: ValueStore> RequestHandler for DhtNode<T, S> {
    fn handle_request(&self, sender: &NodeId, request: Request) -> Response {
        debug!(node = %self.id, %sender, command = request.command(), "Handling request");
        match request {
            Request::Bootstrap(state) => {
                let mut dht = self.dht.lock();
                if !dht.set_peer(sender.clone(), state.version, &state.proof, state.peers) {
                    return Response::State(None);
                }
                dht.commit_state();
                Response::State(dht.get_state(None).ok())
            }
            Request::Get(key) => Response::Value(self.store.get(&key)),
            Request::Put(value) => {
                self.store.set(self.hasher.hash(&value), value);
                Response::Ack
            }
            Request::GetStateProof { target, version } => Response::Proof(
                self.dht
                    .lock()
                    .get_state_proof(&version, &target)
                    .unwrap_or_else(|_| Proof::empty()),
            ),
            Request::GetState(version) => {
                let mut dht = self.dht.lock();
                let state = dht.get_state(version.as_ref()).ok();
                dht.commit_state();
                Response::State(state)
            }
            Request::PutState(state) => {
                self.dht
                    .lock()
                    .set_peer(sender.clone(), state.version, &state.proof, state.peers);
                Response::Ack
            }
        }
    }
}

#[async_trait]
impl<T: PeerTransport, S: ValueStore> DhtApi for DhtNode<T, S> {
    async fn bootstrap(&self, seed: &NodeId) -> Result<bool, DhtError> {
        DhtNode::bootstrap(self, seed).await
    }

    async fn lookup(&self, target: &NodeId) -> Result<Vec<NodeId>, DhtError> {
        DhtNode::lookup(self, target).await
    }

    async fn put(&self, value: Vec<u8>) -> Result<Vec<u8>, DhtError> {
        DhtNode::put(self, value).await
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DhtError> {
        DhtNode::get(self, key).await
    }
}
