//! Lookup Coordinator
//!
//! Iterative Kademlia lookup, one session per `start` call:
//!
//! 1. `start` seeds a candidate trie from direct peers and the neighbours
//!    they vouch for, caps how many candidates any one relay contributes,
//!    and returns the session handle with the first round of probes.
//! 2. `update` folds one verified probe result back in and returns probes
//!    for newly discovered candidates that made the closest set.
//! 3. `finish` drops the session and reports the exact hit or the closest
//!    candidates.
//!
//! The coordinator never talks to the network; the caller runs probes and
//! must fold every result of a round before acting on the next one.

mod coordinator;
mod session;

pub use coordinator::LookupCoordinator;
pub use session::{LookupId, LookupSession};

#[cfg(test)]
mod tests;
