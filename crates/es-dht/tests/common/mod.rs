//! In-process network for integration tests.
//!
//! Every message goes through the wire codec, so a test network exercises
//! the same encoding a real transport would.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use es_dht::{
    DhtConfig, DhtNode, MemoryValueStore, NodeId, PeerTransport, Request, RequestHandler,
    Response, TransportError,
};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_crypto::{HashFunction, Sha256Hasher};

pub type TestNode = DhtNode<Network, MemoryValueStore>;

/// Routes requests between nodes living in the same process.
pub struct Network {
    nodes: RwLock<HashMap<NodeId, Arc<TestNode>>>,
    hasher: Arc<dyn HashFunction>,
    yielding: bool,
}

impl Network {
    /// SHA-256 nodes, requests delivered without suspending.
    pub fn new() -> Arc<Self> {
        Self::with_hasher(Arc::new(Sha256Hasher::new()))
    }

    /// Nodes hashing with `hasher`; ids are as wide as its output.
    pub fn with_hasher(hasher: Arc<dyn HashFunction>) -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(HashMap::new()),
            hasher,
            yielding: false,
        })
    }

    /// Like [`new`](Self::new), but every request yields to the scheduler
    /// before delivery so concurrent callers interleave.
    pub fn yielding() -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(HashMap::new()),
            hasher: Arc::new(Sha256Hasher::new()),
            yielding: true,
        })
    }

    /// Width of node ids on this network.
    pub fn id_len(&self) -> usize {
        self.hasher.output_len()
    }

    /// Create a node with `id` and register it.
    pub fn spawn(self: &Arc<Self>, id: NodeId) -> Arc<TestNode> {
        let node = Arc::new(
            DhtNode::new(
                id.clone(),
                Arc::clone(&self.hasher),
                DhtConfig::default(),
                Arc::clone(self),
                Arc::new(MemoryValueStore::new()),
            )
            .expect("valid node"),
        );
        self.nodes.write().insert(id, Arc::clone(&node));
        node
    }

    pub fn node(&self, id: &NodeId) -> Option<Arc<TestNode>> {
        self.nodes.read().get(id).cloned()
    }

    /// Take a node off the network; later requests to it fail.
    pub fn remove(&self, id: &NodeId) -> bool {
        self.nodes.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }
}

#[async_trait]
impl PeerTransport for Network {
    async fn send(
        &self,
        recipient: &NodeId,
        sender: &NodeId,
        request: Request,
    ) -> Result<Response, TransportError> {
        if self.yielding {
            tokio::task::yield_now().await;
        }
        let node = self
            .node(recipient)
            .ok_or_else(|| TransportError::Unreachable(recipient.clone()))?;

        let malformed = |_| TransportError::UnexpectedResponse("malformed message");
        let request = request
            .encode()
            .and_then(|bytes| Request::decode(&bytes))
            .map_err(malformed)?;
        node.handle_request(sender, request)
            .encode()
            .and_then(|bytes| Response::decode(&bytes))
            .map_err(malformed)
    }
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

pub fn random_id(rng: &mut StdRng) -> NodeId {
    random_id_of(rng, 32)
}

pub fn random_id_of(rng: &mut StdRng, len: usize) -> NodeId {
    NodeId::new((0..len).map(|_| rng.gen::<u8>()).collect::<Vec<u8>>())
}

/// A seed plus `count` nodes that joined through it.
///
/// Once everyone has joined, each node refreshes its view of the seed so
/// all of them know the full set of nodes the seed keeps.
pub async fn bootstrap_network(
    network: &Arc<Network>,
    count: usize,
    rng: &mut StdRng,
) -> (Arc<TestNode>, Vec<Arc<TestNode>>) {
    let width = network.id_len();
    let seed = network.spawn(random_id_of(rng, width));
    let mut nodes = Vec::with_capacity(count);
    for _ in 0..count {
        let node = network.spawn(random_id_of(rng, width));
        assert!(node.bootstrap(seed.id()).await.expect("seed reachable"));
        nodes.push(node);
    }
    for node in &nodes {
        assert!(node.refresh_peer(seed.id()).await.expect("seed reachable"));
    }
    (seed, nodes)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
