//! Routing Trie
//!
//! A binary trie of capacity-bounded leaves keyed on identifier bits. Only
//! the leaf on the path of the trie's anchor id may split, so the trie keeps
//! fine-grained knowledge near its anchor and at most `k` ids per subtree
//! elsewhere.
//!
//! The same structure backs the node's own peer table (anchored at the own
//! id) and each lookup's candidate set (anchored at the lookup target).

mod bucket;

pub use bucket::KBucket;
