//! The staged verification pipeline.
//!
//! Stages run strictly in order and short-circuit on the first failure:
//! signatures, then tree integrity, then freshness, then nonce, then
//! attestation. The order is load-bearing: no collaborator is called, and
//! no content detail leaks into the verdict, until the signatures over the
//! document have verified.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use merkex_envelope::{verify_envelope, Envelope, ResolveVerifier, SignaturePolicy};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::attestation::AttestationVerifierRegistry;
use crate::document::ExchangeDocument;
use crate::error::ExchangeError;
use crate::nonce::NonceRegistry;

/// Where the pipeline stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStage {
    ParseEnvelope,
    VerifySignatures,
    VerifyTree,
    CheckFreshness,
    CheckNonce,
    ResolveAttestationVerifier,
    VerifyAttestation,
    Done,
}

/// Outcome of one pipeline run. Always a value, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeVerdict {
    /// Whether every stage passed.
    pub is_valid: bool,

    /// The stage that failed, or [`VerifyStage::Done`] on success.
    pub stage: VerifyStage,

    /// Human-readable summary of the first failure, or of success.
    pub message: String,

    /// Signature totals from the envelope check.
    pub signature_count: usize,
    pub verified_count: usize,

    /// Identities of the signatures that verified.
    pub signers: Vec<String>,

    /// The parsed document. Present once parsing succeeded, so callers can
    /// inspect what was rejected as well as what passed.
    pub document: Option<ExchangeDocument>,
}

impl ExchangeVerdict {
    fn rejected(stage: VerifyStage, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            stage,
            message: message.into(),
            signature_count: 0,
            verified_count: 0,
            signers: Vec::new(),
            document: None,
        }
    }
}

const DEFAULT_ATTESTATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Configures and builds a [`VerificationPipeline`].
///
/// Missing or nonsensical configuration fails fast here; once built, the
/// pipeline itself never errors.
pub struct PipelineBuilder {
    resolver: Option<Arc<dyn ResolveVerifier>>,
    policy: SignaturePolicy,
    max_age: Option<Duration>,
    nonces: Option<Arc<dyn NonceRegistry>>,
    attesters: AttestationVerifierRegistry,
    attestation_timeout: Duration,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            resolver: None,
            policy: SignaturePolicy::default(),
            max_age: None,
            nonces: None,
            attesters: AttestationVerifierRegistry::new(),
            attestation_timeout: DEFAULT_ATTESTATION_TIMEOUT,
        }
    }

    pub fn signature_resolver(mut self, resolver: Arc<dyn ResolveVerifier>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn policy(mut self, policy: SignaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Maximum accepted document age. A document aged exactly `max_age`
    /// still passes.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn nonce_registry(mut self, nonces: Arc<dyn NonceRegistry>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    pub fn attestation_registry(mut self, attesters: AttestationVerifierRegistry) -> Self {
        self.attesters = attesters;
        self
    }

    pub fn attestation_timeout(mut self, timeout: Duration) -> Self {
        self.attestation_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<VerificationPipeline, ExchangeError> {
        let resolver = self
            .resolver
            .ok_or_else(|| ExchangeError::Configuration("signature resolver is required".into()))?;
        let nonces = self
            .nonces
            .ok_or_else(|| ExchangeError::Configuration("nonce registry is required".into()))?;
        let max_age = self
            .max_age
            .ok_or_else(|| ExchangeError::Configuration("max age is required".into()))?;

        if max_age.is_zero() {
            return Err(ExchangeError::Configuration("max age must be positive".into()));
        }
        if self.attestation_timeout.is_zero() {
            return Err(ExchangeError::Configuration(
                "attestation timeout must be positive".into(),
            ));
        }
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|_| ExchangeError::Configuration("max age out of range".into()))?;

        Ok(VerificationPipeline {
            resolver,
            policy: self.policy,
            max_age,
            nonces,
            attesters: self.attesters,
            attestation_timeout: self.attestation_timeout,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the staged checks over a signed envelope.
pub struct VerificationPipeline {
    resolver: Arc<dyn ResolveVerifier>,
    policy: SignaturePolicy,
    max_age: chrono::Duration,
    nonces: Arc<dyn NonceRegistry>,
    attesters: AttestationVerifierRegistry,
    attestation_timeout: Duration,
}

impl VerificationPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Verify an envelope from its JSON wire form.
    pub async fn verify(&self, envelope_json: &str) -> ExchangeVerdict {
        // ParseEnvelope: structural decode of envelope and payload
        let envelope = match Envelope::from_json(envelope_json) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(stage = ?VerifyStage::ParseEnvelope, error = %e, "pipeline stopped");
                return ExchangeVerdict::rejected(VerifyStage::ParseEnvelope, e.to_string());
            }
        };
        let document = match ExchangeDocument::from_payload(&envelope.payload) {
            Ok(document) => document,
            Err(e) => {
                debug!(stage = ?VerifyStage::ParseEnvelope, error = %e, "pipeline stopped");
                return ExchangeVerdict::rejected(VerifyStage::ParseEnvelope, e.to_string());
            }
        };

        // VerifySignatures
        let report = verify_envelope(&envelope, self.resolver.as_ref(), self.policy);
        let mut verdict = ExchangeVerdict {
            is_valid: false,
            stage: VerifyStage::VerifySignatures,
            message: report.message.clone(),
            signature_count: report.signature_count,
            verified_count: report.verified_count,
            signers: report.verified_signers,
            document: Some(document.clone()),
        };
        if !report.is_valid {
            debug!(stage = ?verdict.stage, message = %verdict.message, "pipeline stopped");
            return verdict;
        }

        // VerifyTree: root recheck of the signed tree
        if let Err(e) = document.tree().verify() {
            verdict.stage = VerifyStage::VerifyTree;
            verdict.message = e.to_string();
            debug!(stage = ?verdict.stage, message = %verdict.message, "pipeline stopped");
            return verdict;
        }

        // CheckFreshness: age must land in [0, max_age]
        let age = Utc::now().signed_duration_since(document.timestamp());
        if age < chrono::Duration::zero() {
            verdict.stage = VerifyStage::CheckFreshness;
            verdict.message = "document timestamp is in the future".to_string();
            debug!(stage = ?verdict.stage, message = %verdict.message, "pipeline stopped");
            return verdict;
        }
        if age > self.max_age {
            verdict.stage = VerifyStage::CheckFreshness;
            verdict.message = format!(
                "document expired: age {}s exceeds maximum {}s",
                age.num_seconds(),
                self.max_age.num_seconds()
            );
            debug!(stage = ?verdict.stage, message = %verdict.message, "pipeline stopped");
            return verdict;
        }

        // CheckNonce
        match self.nonces.is_fresh(document.nonce()).await {
            Ok(true) => {}
            Ok(false) => {
                verdict.stage = VerifyStage::CheckNonce;
                verdict.message = "nonce already used".to_string();
                debug!(stage = ?verdict.stage, "pipeline stopped");
                return verdict;
            }
            Err(e) => {
                verdict.stage = VerifyStage::CheckNonce;
                verdict.message = format!("nonce check failed: {e}");
                warn!(error = %e, "nonce registry error");
                return verdict;
            }
        }

        // Attestation stages only apply to the attested shape
        if let Some(locator) = document.attestation() {
            let Some(verifier) = self.attesters.resolve(&locator.service_id) else {
                verdict.stage = VerifyStage::ResolveAttestationVerifier;
                verdict.message =
                    format!("unsupported attestation service: {}", locator.service_id);
                debug!(stage = ?verdict.stage, message = %verdict.message, "pipeline stopped");
                return verdict;
            };

            let root = document.tree().root;
            let outcome = timeout(self.attestation_timeout, verifier.verify(locator, &root)).await;
            verdict.stage = VerifyStage::VerifyAttestation;
            match outcome {
                Err(_) => {
                    verdict.message = format!(
                        "attestation check cancelled: no result within {:?}",
                        self.attestation_timeout
                    );
                    warn!(service = %locator.service_id, "attestation check timed out");
                    return verdict;
                }
                Ok(Err(e)) => {
                    verdict.message = format!("attestation check failed: {e}");
                    warn!(service = %locator.service_id, error = %e, "attestation check failed");
                    return verdict;
                }
                Ok(Ok(result)) => {
                    if result.digest != root {
                        verdict.message = format!(
                            "attestation root mismatch: service attested {}",
                            result.digest.to_hex()
                        );
                        debug!(stage = ?verdict.stage, message = %verdict.message, "pipeline stopped");
                        return verdict;
                    }
                    if !result.is_valid {
                        verdict.message = format!("attestation invalid: {}", result.message);
                        debug!(stage = ?verdict.stage, message = %verdict.message, "pipeline stopped");
                        return verdict;
                    }
                }
            }
        }

        verdict.is_valid = true;
        verdict.stage = VerifyStage::Done;
        verdict.message = format!("document verified; {}", report.message);
        debug!(signers = ?verdict.signers, "document verified");
        verdict
    }
}
