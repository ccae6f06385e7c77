//! Error types for the exchange layer.

use thiserror::Error;

/// Errors from document codec, pipeline configuration, and attestation
/// collaborators.
///
/// Pipeline verification failures are never carried here: the pipeline
/// reports them as [`ExchangeVerdict`](crate::ExchangeVerdict) values.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("attestation service error: {0}")]
    AttestationService(String),
}
