//! Node-to-node messages.
//!
//! One variant per command a node answers. Encoding is bincode; the core
//! itself never frames or sends bytes.

use serde::{Deserialize, Serialize};

use crate::domain::{DhtError, NodeId, Proof, StateSnapshot, StateVersion};

/// A command sent to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Sender shares its state and asks to be accepted as a peer.
    Bootstrap(StateSnapshot),
    /// Fetch a stored value by key.
    Get(Vec<u8>),
    /// Store a value under its hash.
    Put(Vec<u8>),
    /// Prove `target` is in the recipient's state `version`.
    GetStateProof {
        /// Node to prove.
        target: NodeId,
        /// Recipient state version the requester holds.
        version: StateVersion,
    },
    /// Fetch the recipient's state; `None` for the current one.
    GetState(Option<StateVersion>),
    /// Sender pushes its current state.
    PutState(StateSnapshot),
}

impl Request {
    /// Command name, for logs and errors.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Bootstrap(_) => "bootstrap",
            Self::Get(_) => "get",
            Self::Put(_) => "put",
            Self::GetStateProof { .. } => "get_state_proof",
            Self::GetState(_) => "get_state",
            Self::PutState(_) => "put_state",
        }
    }

    /// Serialize to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, DhtError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DhtError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// A reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Answer to `Bootstrap` and `GetState`; `None` if refused or unknown.
    State(Option<StateSnapshot>),
    /// Answer to `Get`.
    Value(Option<Vec<u8>>),
    /// Answer to `GetStateProof`; empty if the target is not in that state.
    Proof(Proof),
    /// Answer to `Put` and `PutState`.
    Ack,
}

impl Response {
    /// Serialize to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, DhtError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DhtError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            version: StateVersion::new(vec![1u8; 32]),
            proof: Proof::new(vec![0u8; 33]),
            peers: vec![NodeId::new(vec![2u8; 32]), NodeId::new(vec![3u8; 32])],
        }
    }

    #[test]
    fn test_request_codec() {
        let requests = [
            Request::Bootstrap(snapshot()),
            Request::GetStateProof {
                target: NodeId::new(vec![9u8; 32]),
                version: StateVersion::new(vec![8u8; 32]),
            },
            Request::GetState(None),
            Request::Put(b"hello".to_vec()),
        ];
        for request in requests {
            let bytes = request.encode().unwrap();
            assert_eq!(Request::decode(&bytes).unwrap(), request);
        }
    }

    #[test]
    fn test_response_codec() {
        let response = Response::State(Some(snapshot()));
        let bytes = response.encode().unwrap();
        assert_eq!(Response::decode(&bytes).unwrap(), response);
    }

    #[test]
    fn test_decode_garbage_is_codec_error() {
        assert!(matches!(
            Request::decode(&[0xff, 0xff, 0xff, 0xff]),
            Err(DhtError::Codec(_))
        ));
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Request::GetState(None).command(), "get_state");
        assert_eq!(Request::PutState(snapshot()).command(), "put_state");
        assert_eq!(Request::Get(Vec::new()).command(), "get");
    }
}
