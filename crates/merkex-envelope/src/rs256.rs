//! RS256 plugin: RSASSA-PKCS1-v1_5 over SHA-256.

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::sha2::Sha256;
use rsa::signature::{Keypair, SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::algorithm::{SignatureCheck, SignatureSigner, SignatureVerifier};
use crate::error::EnvelopeError;

/// Algorithm identifier for RSASSA-PKCS1-v1_5 with SHA-256.
pub const ALG_RS256: &str = "RS256";

/// Signs envelope inputs with an RSA private key.
pub struct Rs256Signer {
    key: SigningKey<Sha256>,
    kid: Option<String>,
}

impl Rs256Signer {
    /// Generate a fresh keypair of the given modulus size.
    pub fn generate(bits: usize) -> Result<Self, EnvelopeError> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| EnvelopeError::InvalidKey(e.to_string()))?;
        Ok(Self::new(private_key))
    }

    /// Wrap an existing private key.
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self {
            key: SigningKey::new(private_key),
            kid: None,
        }
    }

    /// Attach a key identifier carried in the protected header.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// The public half, for constructing the matching verifier.
    pub fn public_key(&self) -> RsaPublicKey {
        self.key.verifying_key().into()
    }
}

impl SignatureSigner for Rs256Signer {
    fn algorithm(&self) -> &'static str {
        ALG_RS256
    }

    fn kid(&self) -> Option<String> {
        self.kid.clone()
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let signature = self
            .key
            .try_sign(signing_input)
            .map_err(|e| EnvelopeError::SigningFailed(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

/// Verifies RS256 signatures against one RSA public key.
pub struct Rs256Verifier {
    key: VerifyingKey<Sha256>,
}

impl Rs256Verifier {
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self {
            key: VerifyingKey::new(public_key),
        }
    }
}

impl SignatureVerifier for Rs256Verifier {
    fn algorithm(&self) -> &'static str {
        ALG_RS256
    }

    fn verify(
        &self,
        _protected: &crate::header::ProtectedHeader,
        signing_input: &[u8],
        signature: &[u8],
    ) -> SignatureCheck {
        let signature = match Signature::try_from(signature) {
            Ok(s) => s,
            Err(e) => return SignatureCheck::fail(format!("malformed RS256 signature: {e}")),
        };
        match self.key.verify(signing_input, &signature) {
            Ok(()) => SignatureCheck::ok(),
            Err(_) => SignatureCheck::fail("RS256 signature mismatch"),
        }
    }
}
