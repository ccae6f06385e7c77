//! Key material and call-counting collaborator doubles.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use merkex_envelope::{
    Es256kSigner, Es256kVerifier, Rs256Signer, Rs256Verifier, VerifierRegistry,
};
use merkex_exchange::{
    AttestationLocator, AttestationResult, AttestationVerifier, ExchangeError, NonceRegistry,
};
use merkex_tree::Sha256Digest;
use serde_json::{json, Value};
use tokio::sync::RwLock;

/// The flat object most tests build trees from.
pub fn sample_object() -> Value {
    json!({"name": "John Doe", "age": 30, "country": "US"})
}

/// One RS256 and one ES256K signer with their matching verifier registry.
///
/// RSA key generation dominates construction time; share one fixture per
/// test where possible.
pub struct SignerFixture {
    pub rs256: Rs256Signer,
    pub es256k: Es256kSigner,
}

impl SignerFixture {
    pub fn generate() -> Self {
        Self {
            rs256: Rs256Signer::generate(2048)
                .unwrap_or_else(|e| panic!("rsa keygen failed: {e}")),
            es256k: Es256kSigner::generate(),
        }
    }

    /// Registry holding the verifiers matching both signers.
    pub fn registry(&self) -> VerifierRegistry {
        VerifierRegistry::new()
            .with(Arc::new(Rs256Verifier::new(self.rs256.public_key())))
            .with(Arc::new(Es256kVerifier::new(self.es256k.address())))
    }
}

/// In-memory nonce registry that counts lookups, for asserting the
/// pipeline's short-circuit property.
#[derive(Default)]
pub struct CountingNonceRegistry {
    seen: RwLock<HashSet<String>>,
    calls: AtomicUsize,
}

impl CountingNonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NonceRegistry for CountingNonceRegistry {
    async fn is_fresh(&self, nonce: &str) -> Result<bool, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.seen.write().await.insert(nonce.to_string()))
    }
}

/// Attestation verifier double with a fixed verdict and a call counter.
///
/// Reports back the expected root by default, or a configured digest to
/// provoke the root-mismatch path.
pub struct CountingAttester {
    service_id: String,
    valid: bool,
    digest_override: Option<Sha256Digest>,
    calls: AtomicUsize,
}

impl CountingAttester {
    pub fn passing(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            valid: true,
            digest_override: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            valid: false,
            digest_override: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Report success for a different digest than the one asked about.
    pub fn with_digest(mut self, digest: Sha256Digest) -> Self {
        self.digest_override = Some(digest);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttestationVerifier for CountingAttester {
    fn service_id(&self) -> &str {
        &self.service_id
    }

    async fn verify(
        &self,
        _locator: &AttestationLocator,
        expected_root: &Sha256Digest,
    ) -> Result<AttestationResult, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AttestationResult {
            is_valid: self.valid,
            message: if self.valid {
                "attestation found".to_string()
            } else {
                "attestation revoked".to_string()
            },
            attester: Some("0x00000000000000000000000000000000000000aa".to_string()),
            digest: self.digest_override.unwrap_or(*expected_root),
        })
    }
}
