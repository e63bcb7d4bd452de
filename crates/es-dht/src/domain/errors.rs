//! Domain Errors

use thiserror::Error;

use super::entities::{NodeId, StateVersion};

/// Errors surfaced by the DHT core and the node service.
#[derive(Debug, Error)]
pub enum DhtError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Hash output is {hash_len} bytes but identifiers are {id_len} bytes")]
    HashLengthMismatch { hash_len: usize, id_len: usize },

    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("State {0} is neither current nor cached")]
    StateNotFound(StateVersion),

    #[error("Protocol violation by {peer}: {reason}")]
    ProtocolViolation { peer: NodeId, reason: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Config error: {0}")]
    ConfigFile(String),
}

/// Why a peer's state claim was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerClaimError {
    #[error("Peer claims our own identifier")]
    OwnIdentifier,

    #[error("Identifier is {actual} bytes, expected {expected}")]
    IdentifierLength { expected: usize, actual: usize },

    #[error("Proof of {blocks} blocks does not fit a tree of {leaves} leaves")]
    ProofShape { blocks: usize, leaves: usize },

    #[error("Proof does not verify against the claimed version")]
    ProofMismatch,
}

/// Failures of the outbound transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Peer unreachable: {0}")]
    Unreachable(NodeId),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}
