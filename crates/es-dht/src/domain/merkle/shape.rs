//! Proof-height check for self-proofs.
//!
//! A node announcing `n` neighbours has `2n + 2` leaves, which fixes the
//! height of its tree. A proof of any other height is rejected. When the
//! leaf count is not a power of two the self-pair sits at the ragged right
//! edge, so its lowest siblings are forced: the own id, then
//! `hash(id || id)`, then `hash` of that doubled, for as many levels as the
//! leaf count leaves the node without a real partner. Those blocks are
//! checked literally.

use shared_crypto::HashFunction;

use super::tree::SIBLING_RIGHT;

/// `true` if `proof` has the height and padding chain a self-proof of
/// `peer_id` over `neighbor_count` neighbours must have.
pub fn is_valid_proof_shape(
    proof: &[u8],
    peer_id: &[u8],
    neighbor_count: usize,
    hasher: &dyn HashFunction,
) -> bool {
    let block = peer_id.len() + 1;
    if proof.len() % block != 0 {
        return false;
    }
    let height = proof.len() / block;
    let items = 2 * neighbor_count + 2;
    let full_height = items.next_power_of_two().trailing_zeros() as usize;

    if height != full_height {
        return false;
    }
    if items.is_power_of_two() {
        return true;
    }

    let log = (items as f64).log2();
    let checked = (log * log - items as f64).ceil() / 2.0;
    let mut expected = peer_id.to_vec();
    let mut level = 0usize;
    while (level as f64) <= checked {
        let Some(chunk) = proof.get(level * block..(level + 1) * block) else {
            return false;
        };
        if chunk[0] != SIBLING_RIGHT || chunk[1..] != expected[..] {
            return false;
        }
        expected = hasher.hash_pair(&expected, &expected);
        level += 1;
    }
    true
}
