//! Merkle Proof Engine
//!
//! Binary Merkle tree over a leaf sequence `[id0, v0, id1, v1, ..., own, own]`.
//!
//! # Construction
//!
//! - Level 0 holds the raw leaves; they are not hashed on their own.
//! - Each parent is `hash(left || right)`.
//! - A level with an odd number of nodes pairs its last node with itself.
//!
//! # Proof format
//!
//! One block per level, bottom-up: a marker byte (`0` = sibling on the
//! right, `1` = sibling on the left) followed by the sibling. Siblings at
//! level 0 are raw leaves and above are digests, so ids, versions and hash
//! output must share one width `N`; a block is `N + 1` bytes.

mod shape;
mod tree;

pub use shape::is_valid_proof_shape;
pub use tree::{check_state_proof, compute_proof, compute_root, verify_proof};
