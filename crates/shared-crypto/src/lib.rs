//! # Shared Crypto - Hash Primitives
//!
//! The DHT core never picks a hash function itself: identifiers, state
//! versions and Merkle nodes are all produced by a [`HashFunction`] handed
//! in at construction time.
//!
//! ## Components
//!
//! | Type | Algorithm | Output |
//! |------|-----------|--------|
//! | [`Sha256Hasher`] | SHA-256 | 32 bytes |
//! | [`Blake3Hasher`] | BLAKE3 | 32 bytes |
//! | [`Sha1Hasher`] | SHA-1 | 20 bytes |
//!
//! All are deterministic and collision resistant, which is all the proof
//! scheme relies on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hashing;

// Re-exports
pub use hashing::{blake3_hash, sha256_hash, Blake3Hasher, HashFunction, Sha1Hasher, Sha256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
