//! Ports Layer - Trait definitions at the edge of the core
//!
//! - `inbound`: what the node offers (`DhtApi`, `RequestHandler`)
//! - `outbound`: what the host must provide (`PeerTransport`, `ValueStore`,
//!   `ConfigProvider`)
//! - `messages`: the request/response vocabulary exchanged between nodes

pub mod inbound;
pub mod messages;
pub mod outbound;

pub use inbound::{DhtApi, RequestHandler};
pub use messages::{Request, Response};
pub use outbound::{ConfigProvider, PeerTransport, TransportError, ValueStore};
