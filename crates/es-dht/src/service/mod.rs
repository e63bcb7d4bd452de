//! Service Layer - wires the `Dht` aggregate to the outbound ports
//!
//! `DhtNode` runs lookups over a `PeerTransport`, keeps application values
//! in a `ValueStore` and answers requests from other nodes.

mod node;

pub use node::DhtNode;
