//! # Merkex Envelope
//!
//! Multi-signer cryptographic envelopes: one payload, N independent
//! signatures, each with its own protected header.
//!
//! The signing input for every signature is the byte-exact JWS form
//! `base64url(protectedHeader) || "." || base64url(payload)` - a
//! cross-implementation contract, not an implementation detail.
//!
//! ## Key Types
//!
//! - [`Envelope`] / [`EnvelopeBuilder`] - wire codec and signing
//! - [`SignatureSigner`] / [`SignatureVerifier`] - pluggable algorithms
//! - [`Rs256Signer`] / [`Es256kSigner`] - the two concrete strategies
//! - [`verify_envelope`] - the resolution-and-policy orchestrator

pub mod algorithm;
pub mod b64;
pub mod envelope;
pub mod error;
pub mod es256k;
pub mod header;
pub mod rs256;
pub mod verify;

pub use algorithm::{SignatureCheck, SignatureSigner, SignatureVerifier};
pub use envelope::{Envelope, EnvelopeBuilder, EnvelopeSignature};
pub use error::EnvelopeError;
pub use es256k::{ethereum_address, Es256kSigner, Es256kVerifier, ALG_ES256K};
pub use header::ProtectedHeader;
pub use rs256::{Rs256Signer, Rs256Verifier, ALG_RS256};
pub use verify::{
    verify_envelope, ResolveVerifier, SignaturePolicy, VerificationReport, VerifierRegistry,
};
