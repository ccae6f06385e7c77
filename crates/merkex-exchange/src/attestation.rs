//! Attestation collaborator contract: a pluggable verifier per service,
//! a case-insensitive registry, and endpoint fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use merkex_tree::Sha256Digest;
use tracing::warn;

use crate::document::AttestationLocator;
use crate::error::ExchangeError;

/// What an attestation service reported for one locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResult {
    /// Whether the service considers the attestation valid.
    pub is_valid: bool,

    /// Human-readable detail from the service.
    pub message: String,

    /// The attester identity the service saw, when it reports one.
    pub attester: Option<String>,

    /// The digest the attestation covers. The pipeline byte-compares this
    /// against the document's tree root; a success report for a different
    /// digest is a root mismatch, never a pass.
    pub digest: Sha256Digest,
}

/// One attestation service's verification contract.
///
/// The only operation in the workspace that performs network I/O. The
/// pipeline wraps calls in a timeout; implementations need not.
#[async_trait]
pub trait AttestationVerifier: Send + Sync {
    /// Service identifier this verifier answers for.
    fn service_id(&self) -> &str;

    /// Check the claim the locator points at.
    ///
    /// `Err` means the check could not be carried out (transport failure,
    /// cancelled call); it is never a statement about validity.
    async fn verify(
        &self,
        locator: &AttestationLocator,
        expected_root: &Sha256Digest,
    ) -> Result<AttestationResult, ExchangeError>;
}

/// Lookup table of attestation verifiers keyed by service id.
///
/// Ids match case-insensitively: locators arrive from foreign producers
/// with no casing guarantee.
#[derive(Default, Clone)]
pub struct AttestationVerifierRegistry {
    verifiers: HashMap<String, Arc<dyn AttestationVerifier>>,
}

impl AttestationVerifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verifier under its own service id. A second registration
    /// for the same id replaces the first.
    pub fn with(mut self, verifier: Arc<dyn AttestationVerifier>) -> Self {
        self.verifiers
            .insert(verifier.service_id().to_lowercase(), verifier);
        self
    }

    pub fn resolve(&self, service_id: &str) -> Option<Arc<dyn AttestationVerifier>> {
        self.verifiers.get(&service_id.to_lowercase()).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }
}

/// Tries independently configured verifiers for one logical service in
/// order until one returns a conclusive result.
///
/// A returned [`AttestationResult`] is conclusive whether valid or not;
/// only transport-class errors fall through to the next delegate.
pub struct FallbackVerifier {
    service_id: String,
    delegates: Vec<Arc<dyn AttestationVerifier>>,
}

impl FallbackVerifier {
    pub fn new(
        service_id: impl Into<String>,
        delegates: Vec<Arc<dyn AttestationVerifier>>,
    ) -> Result<Self, ExchangeError> {
        if delegates.is_empty() {
            return Err(ExchangeError::Configuration(
                "fallback verifier needs at least one delegate".into(),
            ));
        }
        Ok(Self {
            service_id: service_id.into(),
            delegates,
        })
    }
}

#[async_trait]
impl AttestationVerifier for FallbackVerifier {
    fn service_id(&self) -> &str {
        &self.service_id
    }

    async fn verify(
        &self,
        locator: &AttestationLocator,
        expected_root: &Sha256Digest,
    ) -> Result<AttestationResult, ExchangeError> {
        let mut last_error = None;
        for (index, delegate) in self.delegates.iter().enumerate() {
            match delegate.verify(locator, expected_root).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(service = %self.service_id, index, error = %e, "attestation endpoint failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        // new() guarantees at least one delegate ran
        Err(last_error.unwrap_or_else(|| {
            ExchangeError::AttestationService("no attestation endpoint available".into())
        }))
    }
}
