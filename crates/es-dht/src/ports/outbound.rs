//! # Driven Ports (Outbound SPI)
//!
//! These are the interfaces the node **requires** the host application to
//! implement.

use async_trait::async_trait;

use super::messages::{Request, Response};
use crate::domain::{DhtConfig, NodeId};

pub use crate::domain::TransportError;

/// Delivers a request to a peer and returns its reply.
///
/// Timeouts and retries belong to the implementation; the node treats any
/// error as "probe failed".
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: a lookup round sends several
/// requests concurrently.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Send `request` from `sender` to `recipient`.
    async fn send(
        &self,
        recipient: &NodeId,
        sender: &NodeId,
        request: Request,
    ) -> Result<Response, TransportError>;
}

/// Application key/value storage, keyed by value hash.
pub trait ValueStore: Send + Sync {
    /// `true` if a value is stored under `key`.
    fn has(&self, key: &[u8]) -> bool;

    /// Stored value under `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Store `value` under `key`.
    fn set(&self, key: Vec<u8>, value: Vec<u8>);
}

/// Source of node configuration.
pub trait ConfigProvider: Send + Sync {
    /// DHT tunables.
    fn dht_config(&self) -> DhtConfig;

    /// Peers to bootstrap through.
    fn bootstrap_nodes(&self) -> Vec<NodeId>;
}
