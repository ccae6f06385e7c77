//! The uniform sign/verify contract implemented by algorithm plugins.

use std::collections::BTreeMap;

use crate::error::EnvelopeError;
use crate::header::ProtectedHeader;

/// Outcome of checking one signature.
///
/// Verifiers report failure as a value, never as an error: a bad signature
/// is a normal answer, not an exceptional condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Whether the signature verified.
    pub valid: bool,

    /// Human-readable reasons when it did not.
    pub errors: Vec<String>,
}

impl SignatureCheck {
    /// A passing check.
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing check with one reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![reason.into()],
        }
    }
}

/// A signing strategy: produces signature bytes over a signing input.
pub trait SignatureSigner {
    /// Algorithm identifier placed in the protected header.
    fn algorithm(&self) -> &'static str;

    /// Optional key identifier for the protected header.
    fn kid(&self) -> Option<String> {
        None
    }

    /// Hints placed in the unprotected header (e.g. a derived signer
    /// address). Never integrity-protected; verification must not rely on
    /// them for anything but plugin resolution.
    fn header_hints(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Sign the canonical signing input bytes.
    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, EnvelopeError>;
}

/// A verification strategy for one algorithm.
///
/// Implementations must be thread-safe: signatures within one envelope
/// have no data dependency and may be checked in parallel.
pub trait SignatureVerifier: Send + Sync {
    /// Algorithm identifier this verifier handles.
    fn algorithm(&self) -> &'static str;

    /// Check one signature over the signing input.
    fn verify(
        &self,
        protected: &ProtectedHeader,
        signing_input: &[u8],
        signature: &[u8],
    ) -> SignatureCheck;
}
