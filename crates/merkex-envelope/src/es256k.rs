//! ES256K plugin: secp256k1 ECDSA with public key recovery.
//!
//! Signatures are 64-byte compact `(r, s)` with no recovery byte on the
//! wire. Verification recovers candidate public keys for every recovery id
//! and accepts the signature if any candidate's derived Ethereum address
//! matches the expected signer. The signing input is prehashed with
//! SHA-256 before the curve operation.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::algorithm::{SignatureCheck, SignatureSigner, SignatureVerifier};
use crate::error::EnvelopeError;

/// Algorithm identifier for secp256k1 ECDSA with SHA-256.
pub const ALG_ES256K: &str = "ES256K";

/// Compact signature length: 32-byte `r` then 32-byte `s`.
pub const COMPACT_SIGNATURE_LEN: usize = 64;

/// Ethereum-style address for a secp256k1 public key.
///
/// `"0x"` plus the hex of the last 20 bytes of the Keccak-256 digest of
/// the uncompressed SEC1 point, excluding its `0x04` prefix byte.
pub fn ethereum_address(verifying_key: &VerifyingKey) -> String {
    let point = verifying_key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

/// Signs envelope inputs with a secp256k1 private key.
pub struct Es256kSigner {
    key: SigningKey,
    kid: Option<String>,
}

impl Es256kSigner {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::random(&mut rand::thread_rng()),
            kid: None,
        }
    }

    /// Load a key from its 32-byte scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let key =
            SigningKey::from_slice(bytes).map_err(|e| EnvelopeError::InvalidKey(e.to_string()))?;
        Ok(Self { key, kid: None })
    }

    /// Attach a key identifier carried in the protected header.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// The Ethereum address derived from this key's public half.
    pub fn address(&self) -> String {
        ethereum_address(self.key.verifying_key())
    }
}

impl SignatureSigner for Es256kSigner {
    fn algorithm(&self) -> &'static str {
        ALG_ES256K
    }

    fn kid(&self) -> Option<String> {
        self.kid.clone()
    }

    fn header_hints(&self) -> std::collections::BTreeMap<String, String> {
        std::collections::BTreeMap::from([("address".to_string(), self.address())])
    }

    fn sign(&self, signing_input: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let prehash = Sha256::digest(signing_input);
        // The recovery id is deliberately not emitted; verification
        // brute-forces it.
        let (signature, _recovery_id) = self
            .key
            .sign_prehash_recoverable(prehash.as_slice())
            .map_err(|e| EnvelopeError::SigningFailed(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

/// Verifies ES256K signatures against an expected Ethereum address.
///
/// Holds no key material: the signer's public key is recovered from the
/// signature itself and only its derived address is compared, case
/// insensitively.
pub struct Es256kVerifier {
    expected_address: String,
}

impl Es256kVerifier {
    pub fn new(expected_address: impl Into<String>) -> Self {
        Self {
            expected_address: expected_address.into(),
        }
    }
}

impl SignatureVerifier for Es256kVerifier {
    fn algorithm(&self) -> &'static str {
        ALG_ES256K
    }

    fn verify(
        &self,
        _protected: &crate::header::ProtectedHeader,
        signing_input: &[u8],
        signature: &[u8],
    ) -> SignatureCheck {
        if signature.len() != COMPACT_SIGNATURE_LEN {
            return SignatureCheck::fail(
                EnvelopeError::InvalidSignatureLength(signature.len()).to_string(),
            );
        }
        let signature = match Signature::from_slice(signature) {
            Ok(s) => s,
            Err(e) => return SignatureCheck::fail(format!("malformed ES256K signature: {e}")),
        };

        let prehash = Sha256::digest(signing_input);
        for byte in 0..=3u8 {
            let recovery_id = match RecoveryId::from_byte(byte) {
                Some(id) => id,
                None => continue,
            };
            let Ok(candidate) =
                VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recovery_id)
            else {
                continue;
            };
            if ethereum_address(&candidate).eq_ignore_ascii_case(&self.expected_address) {
                return SignatureCheck::ok();
            }
        }

        SignatureCheck::fail(
            EnvelopeError::SignerMismatch {
                expected: self.expected_address.clone(),
            }
            .to_string(),
        )
    }
}
