//! # Hash Functions
//!
//! Pluggable, stateless hashing behind the [`HashFunction`] trait.
//!
//! The Merkle code concatenates two nodes and hashes them, so the output
//! length of the chosen function fixes the identifier width of a network.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Deterministic byte-to-byte hash used for identifiers and Merkle nodes.
pub trait HashFunction: Send + Sync {
    /// Hash `data` and return the digest.
    fn hash(&self, data: &[u8]) -> Vec<u8>;

    /// Length in bytes of every digest this function returns.
    fn output_len(&self) -> usize;

    /// Hash the concatenation `left || right`.
    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(left.len() + right.len());
        buf.extend_from_slice(left);
        buf.extend_from_slice(right);
        self.hash(&buf)
    }
}

/// SHA-256 (FIPS 180-4).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }
}

impl HashFunction for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        sha256_hash(data).to_vec()
    }

    fn output_len(&self) -> usize {
        32
    }

    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().to_vec()
    }
}

/// BLAKE3 in its default 256-bit mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl Blake3Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }
}

impl HashFunction for Blake3Hasher {
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        blake3_hash(data).to_vec()
    }

    fn output_len(&self) -> usize {
        blake3::OUT_LEN
    }

    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().as_bytes().to_vec()
    }
}

/// SHA-1, for networks that use 160-bit identifiers.
///
/// Kept for interoperability with 20-byte ids; prefer SHA-256 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Hasher;

impl Sha1Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }
}

impl HashFunction for Sha1Hasher {
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        Sha1::digest(data).to_vec()
    }

    fn output_len(&self) -> usize {
        20
    }

    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut hasher = Sha1::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().to_vec()
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256_hash(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}
