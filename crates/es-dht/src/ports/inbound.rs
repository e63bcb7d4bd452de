//! # Driving Ports (Inbound API)
//!
//! What a node offers to its host and to other nodes.

use async_trait::async_trait;

use super::messages::{Request, Response};
use crate::domain::{DhtError, NodeId};

/// Operations the host application drives.
#[async_trait]
pub trait DhtApi: Send + Sync {
    /// Join the network through `seed`. Returns whether the seed accepted us.
    async fn bootstrap(&self, seed: &NodeId) -> Result<bool, DhtError>;

    /// Find `target`, or the closest nodes to it.
    async fn lookup(&self, target: &NodeId) -> Result<Vec<NodeId>, DhtError>;

    /// Store `value` on the nodes closest to its hash. Returns the key.
    async fn put(&self, value: Vec<u8>) -> Result<Vec<u8>, DhtError>;

    /// Retrieve the value stored under `key`.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, DhtError>;
}

/// Receiving side of [`Request`]s from other nodes.
pub trait RequestHandler: Send + Sync {
    /// Answer `request` sent by `sender`.
    fn handle_request(&self, sender: &NodeId, request: Request) -> Response;
}
