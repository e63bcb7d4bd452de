//! # es-dht
//!
//! A Kademlia distributed hash table whose nodes can prove what they say
//! about their neighbours.
//!
//! Every node summarises its peer list as a Merkle root, the *state
//! version*. When node A relays "B is my peer and B's state is `v`", any
//! third party can ask A for an inclusion proof of `(B, v)` in A's state and
//! then ask B for `v` itself, so a relay cannot invent neighbours for
//! somebody else.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** XOR routing trie, Merkle proofs, peer state, lookup
//!   state machine. Synchronous, no I/O.
//! - **Ports Layer:** transport, value store and configuration traits plus
//!   the wire messages.
//! - **Service Layer:** [`DhtNode`] drives lookups over a [`PeerTransport`]
//!   and answers inbound requests.
//! - **Adapters Layer:** in-memory store and config providers.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use es_dht::{Dht, DhtConfig, NodeId};
//! use shared_crypto::{HashFunction, Sha256Hasher};
//!
//! let hasher = Arc::new(Sha256Hasher::new());
//! let id = NodeId::new(hasher.hash(b"alice"));
//! let mut dht = Dht::new(id, hasher, DhtConfig::default()).unwrap();
//!
//! // Nothing known yet: a lookup has nothing to probe.
//! let target = NodeId::new(vec![0u8; 32]);
//! let (lookup, probes) = dht.start_lookup(&target, None);
//! assert!(probes.is_empty());
//! assert_eq!(dht.finish_lookup(&lookup), Some(Vec::new()));
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use adapters::{MemoryValueStore, StaticConfigProvider, TomlConfigProvider};
pub use domain::{
    check_state_proof, compute_proof, compute_root, verify_proof, xor_distance, Dht, DhtConfig,
    DhtError, Distance, KBucket, LookupCoordinator, LookupId, LookupItem, LookupSession, NodeId,
    PeerClaimError, PeerEntry, PeerStateModel, PeerTable, Proof, StateSnapshot, StateVersion,
};
pub use ports::{
    ConfigProvider, DhtApi, PeerTransport, Request, RequestHandler, Response, TransportError,
    ValueStore,
};
pub use service::DhtNode;
