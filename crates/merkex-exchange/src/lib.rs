//! # Merkex Exchange
//!
//! The exchange-document layer: wraps a hash tree with a timestamp, a
//! single-use nonce, and optionally an attestation locator, then drives a
//! strictly staged verification pipeline over the signed envelope.
//!
//! The stage order (signatures, then tree, then freshness, then nonce,
//! then attestation) is a deliberate information-leakage control: nothing
//! about a document's content or replay status is checked, or observable
//! through collaborator calls, until its signatures have verified.
//!
//! ## Key Types
//!
//! - [`TimestampedDocument`] / [`AttestedDocument`] - the envelope payloads
//! - [`VerificationPipeline`] - the staged verifier
//! - [`AttestationVerifier`] / [`NonceRegistry`] - async collaborator traits

pub mod attestation;
pub mod document;
pub mod error;
pub mod nonce;
pub mod pipeline;

pub use attestation::{
    AttestationResult, AttestationVerifier, AttestationVerifierRegistry, FallbackVerifier,
};
pub use document::{
    generate_nonce, AttestationLocator, AttestedDocument, ExchangeDocument, TimestampedDocument,
    NONCE_HEX_LEN,
};
pub use error::ExchangeError;
pub use nonce::{MemoryNonceRegistry, NonceRegistry};
pub use pipeline::{ExchangeVerdict, PipelineBuilder, VerificationPipeline, VerifyStage};
