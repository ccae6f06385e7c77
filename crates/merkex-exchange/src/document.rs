//! Exchange document payloads: a hash tree plus replay and freshness
//! metadata, optionally extended with an attestation locator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use merkex_tree::MerkleTree;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;

/// Nonce length in random bytes.
pub const NONCE_BYTE_LEN: usize = 16;

/// Nonce length as rendered on the wire (lowercase hex).
pub const NONCE_HEX_LEN: usize = 2 * NONCE_BYTE_LEN;

/// A fresh single-use nonce: 16 random bytes as 32 hex characters.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTE_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A hash tree wrapped with freshness and replay metadata.
///
/// Immutable once built; serialized as a whole into an envelope payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampedDocument {
    /// The wrapped tree. The document owns it exclusively.
    pub merkle_tree: MerkleTree,

    /// Issuance instant, ISO-8601 on the wire.
    pub timestamp: DateTime<Utc>,

    /// Single-use random hex nonce.
    pub nonce: String,

    /// Optional recipient hints, opaque to verification.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub issued_to: Option<BTreeMap<String, String>>,
}

impl TimestampedDocument {
    /// Wrap a tree with the current time and a fresh nonce.
    pub fn new(merkle_tree: MerkleTree) -> Self {
        Self {
            merkle_tree,
            timestamp: Utc::now(),
            nonce: generate_nonce(),
            issued_to: None,
        }
    }

    /// Attach recipient hints.
    pub fn with_issued_to(mut self, issued_to: BTreeMap<String, String>) -> Self {
        self.issued_to = Some(issued_to);
        self
    }
}

/// Reference to an externally verifiable on-chain claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationLocator {
    /// Which attestation service holds the claim. Matched case
    /// insensitively against registered verifiers.
    pub service_id: String,

    /// Network the claim lives on.
    pub network: String,

    /// Schema the claim conforms to.
    pub schema_id: String,

    /// The claim itself.
    pub attestation_id: String,

    /// Who attested.
    pub attester_address: String,

    /// Who the claim was issued to.
    pub recipient_address: String,
}

/// A timestamped document plus an attestation locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestedDocument {
    #[serde(flatten)]
    pub timestamped: TimestampedDocument,

    pub attestation: AttestationLocator,
}

impl AttestedDocument {
    pub fn new(timestamped: TimestampedDocument, attestation: AttestationLocator) -> Self {
        Self {
            timestamped,
            attestation,
        }
    }
}

/// Either exchange document shape, as found in an envelope payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeDocument {
    Timestamped(TimestampedDocument),
    Attested(AttestedDocument),
}

impl ExchangeDocument {
    /// Decode an envelope payload. The attested shape is recognized by the
    /// presence of its `attestation` object.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ExchangeError> {
        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| ExchangeError::MalformedDocument(e.to_string()))?;

        if value.get("attestation").is_some() {
            let doc: AttestedDocument = serde_json::from_value(value)
                .map_err(|e| ExchangeError::MalformedDocument(e.to_string()))?;
            Ok(Self::Attested(doc))
        } else {
            let doc: TimestampedDocument = serde_json::from_value(value)
                .map_err(|e| ExchangeError::MalformedDocument(e.to_string()))?;
            Ok(Self::Timestamped(doc))
        }
    }

    /// Serialize to the envelope payload bytes.
    pub fn to_payload(&self) -> Result<Vec<u8>, ExchangeError> {
        let result = match self {
            Self::Timestamped(doc) => serde_json::to_vec(doc),
            Self::Attested(doc) => serde_json::to_vec(doc),
        };
        result.map_err(|e| ExchangeError::MalformedDocument(e.to_string()))
    }

    /// The timestamped core shared by both shapes.
    pub fn timestamped(&self) -> &TimestampedDocument {
        match self {
            Self::Timestamped(doc) => doc,
            Self::Attested(doc) => &doc.timestamped,
        }
    }

    /// The attestation locator, when present.
    pub fn attestation(&self) -> Option<&AttestationLocator> {
        match self {
            Self::Timestamped(_) => None,
            Self::Attested(doc) => Some(&doc.attestation),
        }
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.timestamped().merkle_tree
    }

    pub fn nonce(&self) -> &str {
        &self.timestamped().nonce
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamped().timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merkex_tree::MerkleTreeBuilder;
    use serde_json::json;

    fn sample_tree() -> MerkleTree {
        MerkleTreeBuilder::new()
            .build(&json!({"name": "John Doe", "age": 30}))
            .unwrap()
    }

    fn sample_locator() -> AttestationLocator {
        AttestationLocator {
            service_id: "eas".to_string(),
            network: "sepolia".to_string(),
            schema_id: "0xschema".to_string(),
            attestation_id: "0xattid".to_string(),
            attester_address: "0xattester".to_string(),
            recipient_address: "0xrecipient".to_string(),
        }
    }

    #[test]
    fn test_nonce_shape_and_uniqueness() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), NONCE_HEX_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamped_wire_roundtrip() {
        let doc = TimestampedDocument::new(sample_tree());
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"merkleTree\""));
        assert!(!json.contains("issuedTo"));

        let back: TimestampedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn test_issued_to_serialized_when_present() {
        let doc = TimestampedDocument::new(sample_tree())
            .with_issued_to(BTreeMap::from([("email".to_string(), "a@b.c".to_string())]));
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"issuedTo\""));
    }

    #[test]
    fn test_attested_wire_flattens_core_fields() {
        let doc = AttestedDocument::new(TimestampedDocument::new(sample_tree()), sample_locator());
        let value: serde_json::Value = serde_json::to_value(&doc).unwrap();

        // Core fields sit at top level next to the locator
        assert!(value.get("merkleTree").is_some());
        assert!(value.get("nonce").is_some());
        assert_eq!(value["attestation"]["serviceId"], "eas");
        assert_eq!(value["attestation"]["attesterAddress"], "0xattester");
    }

    #[test]
    fn test_from_payload_dispatches_on_attestation_presence() {
        let plain = TimestampedDocument::new(sample_tree());
        let payload = serde_json::to_vec(&plain).unwrap();
        assert!(matches!(
            ExchangeDocument::from_payload(&payload).unwrap(),
            ExchangeDocument::Timestamped(_)
        ));

        let attested = AttestedDocument::new(plain, sample_locator());
        let payload = serde_json::to_vec(&attested).unwrap();
        let parsed = ExchangeDocument::from_payload(&payload).unwrap();
        assert!(matches!(parsed, ExchangeDocument::Attested(_)));
        assert_eq!(parsed.attestation().unwrap().service_id, "eas");
    }

    #[test]
    fn test_from_payload_rejects_garbage() {
        assert!(matches!(
            ExchangeDocument::from_payload(b"not json"),
            Err(ExchangeError::MalformedDocument(_))
        ));
        assert!(matches!(
            ExchangeDocument::from_payload(b"{\"timestamp\":\"2026-01-01T00:00:00Z\"}"),
            Err(ExchangeError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_payload_roundtrip() {
        let doc = ExchangeDocument::Timestamped(TimestampedDocument::new(sample_tree()));
        let payload = doc.to_payload().unwrap();
        assert_eq!(ExchangeDocument::from_payload(&payload).unwrap(), doc);
    }
}
