//! Domain Layer - Pure DHT logic with no I/O
//!
//! This module contains:
//! - Variable-width identifiers and XOR distance
//! - The routing trie (k-bucket) used for both the peer table and lookups
//! - Merkle root/proof construction and the proof-shape check
//! - The versioned peer-state model with its history cache
//! - The iterative lookup state machine with the anti-Sybil cap
//! - The `Dht` aggregate tying them together

pub mod dht;
pub mod distance;
pub mod entities;
pub mod errors;
pub mod lookup;
pub mod merkle;
pub mod peer_state;
pub mod routing_trie;
pub mod value_objects;

pub use dht::Dht;
pub use distance::xor_distance;
pub use entities::{
    Distance, LookupItem, NodeId, PeerEntry, PeerTable, Proof, StateSnapshot, StateVersion,
};
pub use errors::{DhtError, PeerClaimError, TransportError};
pub use lookup::{LookupCoordinator, LookupId, LookupSession};
pub use merkle::{check_state_proof, compute_proof, compute_root, is_valid_proof_shape, verify_proof};
pub use peer_state::PeerStateModel;
pub use routing_trie::KBucket;
pub use value_objects::DhtConfig;
