//! # Merkex Testkit
//!
//! Shared test support: key-material fixtures, call-counting collaborator
//! doubles, proptest generators for flat JSON objects, and golden vectors
//! with fixed salts for cross-implementation conformance.
//!
//! Everything here is test support; nothing is wired into production
//! paths.

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    sample_object, CountingAttester, CountingNonceRegistry, SignerFixture,
};
pub use generators::{flat_object, json_scalar};
pub use vectors::{fixed_salt, golden_vectors, GoldenVector};
