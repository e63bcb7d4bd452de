//! Kademlia distance calculations.

use crate::domain::{Distance, NodeId};

/// XOR distance between two identifiers.
///
/// The result compares as a big-endian integer: smaller is closer. Both ids
/// are expected to have the same width.
pub fn xor_distance(a: &NodeId, b: &NodeId) -> Distance {
    Distance(
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .map(|(x, y)| x ^ y)
            .collect(),
    )
}
