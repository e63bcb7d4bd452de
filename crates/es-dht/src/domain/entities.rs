//! Core Domain Entities
//!
//! Identifiers, state versions and proofs are all opaque byte strings of
//! a width chosen at runtime (the hash output length). Wrapping them keeps
//! a version from being passed where an id is expected.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! byte_string {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Wrap raw bytes.
            pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Length in bytes.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// `true` if no bytes are held.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Unwrap into the raw bytes.
            pub fn into_bytes(self) -> Vec<u8> {
                self.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), hex::encode(&self.0))
            }
        }
    };
}

byte_string!(
    /// Node identifier, usually the hash of a node's public material.
    ///
    /// Bits are numbered from the most significant bit of the first byte,
    /// which is the order the routing trie descends in.
    NodeId
);

byte_string!(
    /// Merkle root over a node's proof leaves; identifies one peer table.
    StateVersion
);

byte_string!(
    /// Merkle inclusion proof: blocks of `[marker, sibling]`, where marker
    /// `0` means the sibling sits on the right and `1` on the left.
    ///
    /// An empty proof means "no proof available".
    Proof
);

impl NodeId {
    /// Number of addressable bits.
    pub fn bit_len(&self) -> usize {
        self.0.len() * 8
    }

    /// Bit `index` counted MSB-first; out-of-range bits read as zero.
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        self.0
            .get(index / 8)
            .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
    }
}

impl Proof {
    /// An empty proof.
    pub fn empty() -> Self {
        Self(Vec::new())
    }
}

/// XOR of two identifiers, compared as a big-endian integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Distance(pub(crate) Vec<u8>);

impl Distance {
    /// Raw big-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `true` for the distance from an id to itself.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

/// What we know about a direct peer: the state version it proved to us and
/// the neighbour list that version commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    /// Peer's state version at the time it was accepted.
    pub version: StateVersion,
    /// Peer's own peers under that version.
    pub neighbors: Vec<NodeId>,
}

/// Peer id to entry, iterated in ascending id order so Merkle leaves are
/// reproducible.
pub type PeerTable = BTreeMap<NodeId, PeerEntry>;

/// One probe a lookup wants performed: ask `parent_id` (whose state is
/// `parent_version`) to prove `node_id`, then ask `node_id` for its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupItem {
    /// Candidate to connect to.
    pub node_id: NodeId,
    /// Peer that vouched for the candidate.
    pub parent_id: NodeId,
    /// State version of the vouching peer.
    pub parent_version: StateVersion,
}

/// The answer to `get_state`: a version, a self-proof under it and the
/// peer ids it commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// State version.
    pub version: StateVersion,
    /// Proof of the owner's self-pair under `version`.
    pub proof: Proof,
    /// Peer ids in the state, in leaf order.
    pub peers: Vec<NodeId>,
}
