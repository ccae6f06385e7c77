//! Protected header carried inside each signature record.

use serde::{Deserialize, Serialize};

use crate::b64;
use crate::error::EnvelopeError;

/// The integrity-protected portion of a signature record.
///
/// Serialized as compact JSON, then base64url-encoded into the signing
/// input, so its exact bytes are covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    /// Algorithm identifier (e.g. "RS256", "ES256K").
    pub alg: String,

    /// Optional payload type tag.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub typ: Option<String>,

    /// Optional key identifier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,
}

impl ProtectedHeader {
    /// Header with just an algorithm.
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            typ: None,
            kid: None,
        }
    }

    /// Attach a key identifier.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Encode to the base64url form used in the signing input.
    pub fn to_b64(&self) -> Result<String, EnvelopeError> {
        let json = serde_json::to_vec(self).map_err(|e| EnvelopeError::Encoding(e.to_string()))?;
        Ok(b64::encode(&json))
    }

    /// Decode from the base64url wire form.
    pub fn from_b64(encoded: &str) -> Result<Self, EnvelopeError> {
        let json = b64::decode_flexible(encoded)?;
        serde_json::from_slice(&json)
            .map_err(|e| EnvelopeError::Malformed(format!("invalid protected header: {e}")))
    }
}
