//! One-call-chain producer flow: flat JSON object to signed envelope.

use std::collections::BTreeMap;

use merkex_envelope::{Envelope, EnvelopeBuilder, SignatureSigner};
use merkex_exchange::{
    AttestationLocator, AttestedDocument, ExchangeDocument, TimestampedDocument,
};
use merkex_tree::{MerkleTreeBuilder, DEFAULT_SALT_LEN};
use serde_json::Value;
use tracing::debug;

use crate::error::Error;

/// Builds a signed exchange document from a flat JSON object.
///
/// Runs the whole producer side: tree construction, document wrapping
/// with a fresh timestamp and nonce, and envelope signing.
pub struct ExchangeBuilder {
    salt_len: usize,
    issued_to: Option<BTreeMap<String, String>>,
    attestation: Option<AttestationLocator>,
}

impl ExchangeBuilder {
    pub fn new() -> Self {
        Self {
            salt_len: DEFAULT_SALT_LEN,
            issued_to: None,
            attestation: None,
        }
    }

    /// Salt length for every leaf, in bytes.
    pub fn salt_length(mut self, salt_len: usize) -> Self {
        self.salt_len = salt_len;
        self
    }

    /// Recipient hints carried on the document.
    pub fn issued_to(mut self, issued_to: BTreeMap<String, String>) -> Self {
        self.issued_to = Some(issued_to);
        self
    }

    /// Attach an attestation locator, producing the attested shape.
    pub fn attestation(mut self, locator: AttestationLocator) -> Self {
        self.attestation = Some(locator);
        self
    }

    /// Build the tree and document, then sign with every given signer.
    pub fn seal(self, object: &Value, signers: &[&dyn SignatureSigner]) -> Result<Envelope, Error> {
        let tree = MerkleTreeBuilder::new()
            .salt_length(self.salt_len)
            .build(object)?;
        debug!(root = %tree.root, leaves = tree.leaves.len(), "tree built");

        let mut timestamped = TimestampedDocument::new(tree);
        if let Some(issued_to) = self.issued_to {
            timestamped = timestamped.with_issued_to(issued_to);
        }
        let document = match self.attestation {
            Some(locator) => {
                ExchangeDocument::Attested(AttestedDocument::new(timestamped, locator))
            }
            None => ExchangeDocument::Timestamped(timestamped),
        };

        let mut builder = EnvelopeBuilder::new(document.to_payload()?);
        for signer in signers {
            builder = builder.signer(*signer);
        }
        Ok(builder.build()?)
    }
}

impl Default for ExchangeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
