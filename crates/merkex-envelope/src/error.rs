//! Error types for envelope encoding and signing.

use thiserror::Error;

/// Errors from envelope codec and signature plugin operations.
///
/// Verification-path failures do not use this type: the orchestrator and
/// the per-signature [`SignatureCheck`](crate::SignatureCheck) carry them
/// as result values instead.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("signer mismatch: no recovered key matches {expected}")]
    SignerMismatch { expected: String },
}
