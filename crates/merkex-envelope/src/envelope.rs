//! Envelope codec: one payload, N independent signature records.
//!
//! Parsing is structural only and never attempts a cryptographic check;
//! an unresolvable algorithm surfaces at verification time, not here.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::algorithm::SignatureSigner;
use crate::b64;
use crate::error::EnvelopeError;
use crate::header::ProtectedHeader;

/// One signature record of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSignature {
    /// Decoded protected header.
    pub protected: ProtectedHeader,

    /// The exact base64url form of the protected header as it was signed.
    /// Kept verbatim so re-serialization and verification stay byte-exact.
    pub protected_b64: String,

    /// Unprotected header: signer-supplied hints such as a derived address.
    pub header: BTreeMap<String, String>,

    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

/// A multi-signer envelope.
///
/// The payload is shared verbatim by all signatures; each signature covers
/// `base64url(protected) || "." || base64url(payload)`. Signature order
/// carries no semantic weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The payload bytes (a serialized tree or wrapping document).
    pub payload: Bytes,

    /// Independent signature records.
    pub signatures: Vec<EnvelopeSignature>,
}

impl Envelope {
    /// The payload in its base64url signing form.
    pub fn payload_b64(&self) -> String {
        b64::encode(&self.payload)
    }

    /// The canonical signing input for one signature record.
    pub fn signing_input(&self, signature: &EnvelopeSignature) -> Vec<u8> {
        let mut input = signature.protected_b64.clone().into_bytes();
        input.push(b'.');
        input.extend_from_slice(self.payload_b64().as_bytes());
        input
    }

    /// Serialize to the JSON wire format.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Encoding(e.to_string()))
    }

    /// Parse from the JSON wire format. Structural decode only.
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }
}

/// Builder for signed envelopes.
pub struct EnvelopeBuilder<'a> {
    payload: Bytes,
    signers: Vec<&'a dyn SignatureSigner>,
}

impl<'a> EnvelopeBuilder<'a> {
    /// Start building an envelope around a payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            signers: Vec::new(),
        }
    }

    /// Add a signer. Each signer contributes one independent signature.
    pub fn signer(mut self, signer: &'a dyn SignatureSigner) -> Self {
        self.signers.push(signer);
        self
    }

    /// Sign with every registered signer and assemble the envelope.
    ///
    /// The payload base64url form is computed once and shared across all
    /// signing inputs.
    pub fn build(self) -> Result<Envelope, EnvelopeError> {
        if self.signers.is_empty() {
            return Err(EnvelopeError::SigningFailed(
                "at least one signer is required".into(),
            ));
        }

        let payload_b64 = b64::encode(&self.payload);
        let mut signatures = Vec::with_capacity(self.signers.len());

        for signer in self.signers {
            let mut protected = ProtectedHeader::new(signer.algorithm());
            if let Some(kid) = signer.kid() {
                protected = protected.with_kid(kid);
            }
            let protected_b64 = protected.to_b64()?;

            let mut signing_input = protected_b64.clone().into_bytes();
            signing_input.push(b'.');
            signing_input.extend_from_slice(payload_b64.as_bytes());

            let signature = signer.sign(&signing_input)?;

            signatures.push(EnvelopeSignature {
                protected,
                protected_b64,
                header: signer.header_hints(),
                signature,
            });
        }

        Ok(Envelope {
            payload: self.payload,
            signatures,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct EnvelopeWire {
    payload: String,
    signatures: Vec<SignatureWire>,
}

#[derive(Serialize, Deserialize)]
struct SignatureWire {
    protected: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    header: Option<BTreeMap<String, String>>,
    signature: String,
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = EnvelopeWire {
            payload: b64::encode(&self.payload),
            signatures: self
                .signatures
                .iter()
                .map(|sig| SignatureWire {
                    protected: sig.protected_b64.clone(),
                    header: if sig.header.is_empty() {
                        None
                    } else {
                        Some(sig.header.clone())
                    },
                    signature: b64::encode(&sig.signature),
                })
                .collect(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = EnvelopeWire::deserialize(deserializer)?;

        let payload = b64::decode_flexible(&wire.payload).map_err(serde::de::Error::custom)?;

        let mut signatures = Vec::with_capacity(wire.signatures.len());
        for sig in wire.signatures {
            let protected =
                ProtectedHeader::from_b64(&sig.protected).map_err(serde::de::Error::custom)?;
            let signature =
                b64::decode_flexible(&sig.signature).map_err(serde::de::Error::custom)?;
            signatures.push(EnvelopeSignature {
                protected,
                protected_b64: sig.protected,
                header: sig.header.unwrap_or_default(),
                signature,
            });
        }

        Ok(Envelope {
            payload: Bytes::from(payload),
            signatures,
        })
    }
}
