//! Root, proof and verification.

use shared_crypto::HashFunction;

/// Sibling lies to the right of the running node.
pub(crate) const SIBLING_RIGHT: u8 = 0;
/// Sibling lies to the left of the running node.
pub(crate) const SIBLING_LEFT: u8 = 1;

fn next_level(level: &[Vec<u8>], hasher: &dyn HashFunction) -> Vec<Vec<u8>> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hasher.hash_pair(left, right)
        })
        .collect()
}

/// Merkle root of `leaves`.
///
/// A single leaf is its own root; an empty sequence hashes the empty string.
pub fn compute_root<L: AsRef<[u8]>>(leaves: &[L], hasher: &dyn HashFunction) -> Vec<u8> {
    let mut level: Vec<Vec<u8>> = leaves.iter().map(|l| l.as_ref().to_vec()).collect();
    while level.len() > 1 {
        level = next_level(&level, hasher);
    }
    level.pop().unwrap_or_else(|| hasher.hash(&[]))
}

/// Inclusion proof for the pair whose first leaf equals `target`.
///
/// Only even positions are searched, so a version that happens to equal an
/// id cannot shadow the real id leaf. Returns an empty proof when `target`
/// is absent.
pub fn compute_proof<L: AsRef<[u8]>>(
    leaves: &[L],
    target: &[u8],
    hasher: &dyn HashFunction,
) -> Vec<u8> {
    let Some(mut index) = leaves
        .iter()
        .step_by(2)
        .position(|leaf| leaf.as_ref() == target)
        .map(|pair| pair * 2)
    else {
        return Vec::new();
    };

    let mut level: Vec<Vec<u8>> = leaves.iter().map(|l| l.as_ref().to_vec()).collect();
    let mut proof = Vec::new();
    while level.len() > 1 {
        if index % 2 == 0 {
            let sibling = level.get(index + 1).unwrap_or(&level[index]);
            proof.push(SIBLING_RIGHT);
            proof.extend_from_slice(sibling);
        } else {
            proof.push(SIBLING_LEFT);
            proof.extend_from_slice(&level[index - 1]);
        }
        level = next_level(&level, hasher);
        index /= 2;
    }
    proof
}

/// Recompute the path from `leaf` through `proof` and compare with `root`.
///
/// Fails on an empty proof, a length that is not a whole number of
/// `leaf.len() + 1` blocks, or an unknown marker.
pub fn verify_proof(root: &[u8], proof: &[u8], leaf: &[u8], hasher: &dyn HashFunction) -> bool {
    let block = leaf.len() + 1;
    if leaf.is_empty() || proof.is_empty() || proof.len() % block != 0 {
        return false;
    }
    let mut running = leaf.to_vec();
    for chunk in proof.chunks(block) {
        let (marker, sibling) = (chunk[0], &chunk[1..]);
        running = match marker {
            SIBLING_RIGHT => hasher.hash_pair(&running, sibling),
            SIBLING_LEFT => hasher.hash_pair(sibling, &running),
            _ => return false,
        };
    }
    running == root
}

/// Check a proof of `node_id` under `state_version` and return the leaf
/// paired with it.
///
/// For a node's self-proof the paired leaf is the node id again; for a peer
/// inside someone else's state it is that peer's version. Callers compare
/// the result against what they expect. `None` if the first sibling is not
/// on the right or the proof does not verify.
pub fn check_state_proof(
    state_version: &[u8],
    proof: &[u8],
    node_id: &[u8],
    hasher: &dyn HashFunction,
) -> Option<Vec<u8>> {
    if proof.first() != Some(&SIBLING_RIGHT) {
        return None;
    }
    if !verify_proof(state_version, proof, node_id, hasher) {
        return None;
    }
    Some(proof[1..=node_id.len()].to_vec())
}
