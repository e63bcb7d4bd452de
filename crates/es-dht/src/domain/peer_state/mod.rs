//! Peer State Model
//!
//! The node's view of its direct peers, committed to by a Merkle root.
//!
//! - `state` maps each accepted peer to the version it proved and the
//!   neighbours that version lists. It is copy-on-write so committed
//!   snapshots in the history cache share structure with the live table.
//! - `version` is recomputed on every membership change.
//! - The history cache keeps committed versions answerable after the live
//!   state has moved on.

mod history;
mod model;

pub use history::StateHistory;
pub use model::PeerStateModel;
