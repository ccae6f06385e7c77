//! # Merkex Tree
//!
//! Salted-leaf hash trees over flat JSON objects, with selective disclosure.
//!
//! This crate contains no I/O and no networking. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Leaf`] - One salted, hashed unit of disclosable data
//! - [`MerkleTree`] - An ordered sequence of leaves plus a root digest
//! - [`Sha256Digest`] - Content digest (SHA-256, 32 bytes)
//!
//! ## Selective Disclosure
//!
//! Redacting a leaf clears its `data`/`salt` pair while keeping its `hash`,
//! so the root still verifies from the leaf-hash sequence alone. See
//! [`MerkleTree::redact_indices`] and [`MerkleTree::disclose_only`].

pub mod digest;
pub mod error;
pub mod leaf;
pub mod tree;

pub use digest::Sha256Digest;
pub use error::TreeError;
pub use leaf::{
    Leaf, DEFAULT_SALT_LEN, HEADER_LEAF_CONTENT_TYPE, LEAF_CONTENT_TYPE, MAX_SALT_LEN,
    MIN_SALT_LEN,
};
pub use tree::{
    compute_root, MerkleTree, MerkleTreeBuilder, TreeHeader, TREE_HASH_ALG, TREE_TYP,
    TREE_VERSION,
};
