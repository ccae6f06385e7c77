//! # Merkex
//!
//! Selective-disclosure data exchange: salted-hash trees over flat JSON
//! objects, multi-signer envelopes, and timestamped exchange documents
//! verified through a strictly staged pipeline.
//!
//! This crate is the unified facade. The layers live in their own crates
//! and are re-exported here:
//!
//! - [`tree`](merkex_tree) - leaf codec and hash tree engine
//! - [`envelope`](merkex_envelope) - envelope codec, signature plugins,
//!   verification orchestrator
//! - [`exchange`](merkex_exchange) - exchange documents and the
//!   verification pipeline
//!
//! ## Producer side
//!
//! [`ExchangeBuilder`] runs the whole flow in one call chain: object to
//! tree to timestamped (or attested) document to signed envelope.
//!
//! ## Consumer side
//!
//! Parse with [`Envelope::from_json`], or hand the wire string straight to
//! a configured [`VerificationPipeline`].

pub use merkex_envelope as envelope;
pub use merkex_exchange as exchange;
pub use merkex_tree as tree;

pub use merkex_envelope::{
    verify_envelope, Envelope, EnvelopeBuilder, Es256kSigner, Es256kVerifier, Rs256Signer,
    Rs256Verifier, SignaturePolicy, SignatureSigner, SignatureVerifier, VerificationReport,
    VerifierRegistry,
};
pub use merkex_exchange::{
    AttestationLocator, AttestationVerifier, AttestationVerifierRegistry, AttestedDocument,
    ExchangeDocument, ExchangeVerdict, MemoryNonceRegistry, NonceRegistry, PipelineBuilder,
    TimestampedDocument, VerificationPipeline, VerifyStage,
};
pub use merkex_tree::{Leaf, MerkleTree, MerkleTreeBuilder, Sha256Digest};

mod builder;
mod error;

pub use builder::ExchangeBuilder;
pub use error::Error;
