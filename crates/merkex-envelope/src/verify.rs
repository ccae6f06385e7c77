//! Verification orchestrator: resolves a plugin per signature and applies
//! an acceptance policy over the independent results.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::algorithm::SignatureVerifier;
use crate::envelope::{Envelope, EnvelopeSignature};

/// Maps a signature record to the verifier that should check it.
///
/// Resolution failure is not an error: the signature simply counts as
/// unverified in the report.
pub trait ResolveVerifier: Send + Sync {
    fn resolve(&self, signature: &EnvelopeSignature) -> Option<Arc<dyn SignatureVerifier>>;
}

impl<F> ResolveVerifier for F
where
    F: Fn(&EnvelopeSignature) -> Option<Arc<dyn SignatureVerifier>> + Send + Sync,
{
    fn resolve(&self, signature: &EnvelopeSignature) -> Option<Arc<dyn SignatureVerifier>> {
        self(signature)
    }
}

/// A resolver keyed by the protected header's algorithm identifier.
#[derive(Default, Clone)]
pub struct VerifierRegistry {
    verifiers: HashMap<&'static str, Arc<dyn SignatureVerifier>>,
}

impl VerifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a verifier under its own algorithm identifier. A second
    /// registration for the same algorithm replaces the first.
    pub fn with(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifiers.insert(verifier.algorithm(), verifier);
        self
    }
}

impl ResolveVerifier for VerifierRegistry {
    fn resolve(&self, signature: &EnvelopeSignature) -> Option<Arc<dyn SignatureVerifier>> {
        self.verifiers
            .get(signature.protected.alg.as_str())
            .cloned()
    }
}

/// How many of an envelope's signatures must verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturePolicy {
    /// Every signature must verify. An envelope with zero signatures fails.
    #[default]
    RequireAll,
    /// At least one signature must verify.
    RequireAny,
}

/// Aggregate outcome of verifying an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Whether the policy was satisfied.
    pub is_valid: bool,

    /// Total signature records present.
    pub signature_count: usize,

    /// How many of them verified.
    pub verified_count: usize,

    /// Human-readable summary.
    pub message: String,

    /// Identities of the signatures that verified: the unprotected
    /// `address` hint when present, else the kid, else the algorithm.
    pub verified_signers: Vec<String>,
}

fn signer_identity(signature: &EnvelopeSignature) -> String {
    if let Some(address) = signature.header.get("address") {
        return address.clone();
    }
    if let Some(kid) = &signature.protected.kid {
        return kid.clone();
    }
    signature.protected.alg.clone()
}

/// Verify every signature of an envelope and apply the policy.
///
/// Always returns a report; bad signatures, unknown algorithms, and empty
/// envelopes are verdicts, not errors. A signature whose algorithm the
/// resolver cannot map still counts toward `signature_count`.
pub fn verify_envelope(
    envelope: &Envelope,
    resolver: &dyn ResolveVerifier,
    policy: SignaturePolicy,
) -> VerificationReport {
    let signature_count = envelope.signatures.len();
    if signature_count == 0 {
        return VerificationReport {
            is_valid: false,
            signature_count: 0,
            verified_count: 0,
            message: "no signatures present".to_string(),
            verified_signers: Vec::new(),
        };
    }

    let mut verified_count = 0;
    let mut verified_signers = Vec::new();

    for signature in &envelope.signatures {
        let alg = signature.protected.alg.as_str();
        let Some(verifier) = resolver.resolve(signature) else {
            debug!(alg, "no verifier resolved for signature");
            continue;
        };

        let signing_input = envelope.signing_input(signature);
        let check = verifier.verify(&signature.protected, &signing_input, &signature.signature);
        debug!(alg, valid = check.valid, "signature checked");

        if check.valid {
            verified_count += 1;
            verified_signers.push(signer_identity(signature));
        }
    }

    let is_valid = match policy {
        SignaturePolicy::RequireAll => verified_count == signature_count,
        SignaturePolicy::RequireAny => verified_count > 0,
    };

    VerificationReport {
        is_valid,
        signature_count,
        verified_count,
        message: format!("{verified_count} of {signature_count} signatures verified"),
        verified_signers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SignatureCheck;
    use crate::envelope::EnvelopeBuilder;
    use crate::es256k::{Es256kSigner, Es256kVerifier, ALG_ES256K};
    use crate::header::ProtectedHeader;

    struct StubVerifier {
        alg: &'static str,
        valid: bool,
    }

    impl SignatureVerifier for StubVerifier {
        fn algorithm(&self) -> &'static str {
            self.alg
        }

        fn verify(&self, _: &ProtectedHeader, _: &[u8], _: &[u8]) -> SignatureCheck {
            if self.valid {
                SignatureCheck::ok()
            } else {
                SignatureCheck::fail("stubbed failure")
            }
        }
    }

    struct StubSigner {
        alg: &'static str,
    }

    impl crate::algorithm::SignatureSigner for StubSigner {
        fn algorithm(&self) -> &'static str {
            self.alg
        }

        fn sign(&self, _: &[u8]) -> Result<Vec<u8>, crate::error::EnvelopeError> {
            Ok(vec![0u8; 4])
        }
    }

    fn two_signature_envelope() -> Envelope {
        let a = StubSigner { alg: "ALG-A" };
        let b = StubSigner { alg: "ALG-B" };
        EnvelopeBuilder::new(&b"payload"[..])
            .signer(&a)
            .signer(&b)
            .build()
            .unwrap()
    }

    #[test]
    fn test_require_all_passes_when_all_verify() {
        let envelope = two_signature_envelope();
        let registry = VerifierRegistry::new()
            .with(Arc::new(StubVerifier {
                alg: "ALG-A",
                valid: true,
            }))
            .with(Arc::new(StubVerifier {
                alg: "ALG-B",
                valid: true,
            }));

        let report = verify_envelope(&envelope, &registry, SignaturePolicy::RequireAll);
        assert!(report.is_valid);
        assert_eq!(report.signature_count, 2);
        assert_eq!(report.verified_count, 2);
        assert_eq!(report.message, "2 of 2 signatures verified");
    }

    #[test]
    fn test_require_all_fails_on_one_bad_signature() {
        let envelope = two_signature_envelope();
        let registry = VerifierRegistry::new()
            .with(Arc::new(StubVerifier {
                alg: "ALG-A",
                valid: true,
            }))
            .with(Arc::new(StubVerifier {
                alg: "ALG-B",
                valid: false,
            }));

        let report = verify_envelope(&envelope, &registry, SignaturePolicy::RequireAll);
        assert!(!report.is_valid);
        assert_eq!(report.message, "1 of 2 signatures verified");
    }

    #[test]
    fn test_require_any_passes_on_one_good_signature() {
        let envelope = two_signature_envelope();
        let registry = VerifierRegistry::new()
            .with(Arc::new(StubVerifier {
                alg: "ALG-A",
                valid: true,
            }))
            .with(Arc::new(StubVerifier {
                alg: "ALG-B",
                valid: false,
            }));

        let report = verify_envelope(&envelope, &registry, SignaturePolicy::RequireAny);
        assert!(report.is_valid);
        assert_eq!(report.verified_count, 1);
    }

    #[test]
    fn test_unresolved_algorithm_counts_as_unverified() {
        let envelope = two_signature_envelope();
        let registry = VerifierRegistry::new().with(Arc::new(StubVerifier {
            alg: "ALG-A",
            valid: true,
        }));

        let report = verify_envelope(&envelope, &registry, SignaturePolicy::RequireAll);
        assert!(!report.is_valid);
        assert_eq!(report.signature_count, 2);
        assert_eq!(report.verified_count, 1);
    }

    #[test]
    fn test_empty_envelope_is_invalid_under_both_policies() {
        let envelope = Envelope {
            payload: b"payload"[..].into(),
            signatures: Vec::new(),
        };
        let registry = VerifierRegistry::new();

        for policy in [SignaturePolicy::RequireAll, SignaturePolicy::RequireAny] {
            let report = verify_envelope(&envelope, &registry, policy);
            assert!(!report.is_valid);
            assert_eq!(report.message, "no signatures present");
        }
    }

    #[test]
    fn test_closure_resolver() {
        let envelope = two_signature_envelope();
        let resolver = |signature: &EnvelopeSignature| -> Option<Arc<dyn SignatureVerifier>> {
            (signature.protected.alg == "ALG-A").then(|| {
                Arc::new(StubVerifier {
                    alg: "ALG-A",
                    valid: true,
                }) as Arc<dyn SignatureVerifier>
            })
        };

        let report = verify_envelope(&envelope, &resolver, SignaturePolicy::RequireAny);
        assert!(report.is_valid);
        assert_eq!(report.verified_count, 1);
    }

    #[test]
    fn test_verified_signers_prefer_address_hint() {
        let signer = Es256kSigner::generate();
        let envelope = EnvelopeBuilder::new(&b"payload"[..])
            .signer(&signer)
            .build()
            .unwrap();
        let registry =
            VerifierRegistry::new().with(Arc::new(Es256kVerifier::new(signer.address())));

        let report = verify_envelope(&envelope, &registry, SignaturePolicy::RequireAll);
        assert!(report.is_valid);
        assert_eq!(report.verified_signers, vec![signer.address()]);
        assert_eq!(envelope.signatures[0].protected.alg, ALG_ES256K);
    }
}
