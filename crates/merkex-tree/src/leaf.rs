//! Leaf: one salted, hashed unit of disclosable data.
//!
//! A leaf binds a JSON value to a random salt: `hash = SHA256(salt || data)`.
//! Redaction drops the `data`/`salt` pair while keeping the hash, so a
//! redacted leaf still contributes to the root without revealing anything.

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::{decode_hex, encode_hex, Sha256Digest};
use crate::error::TreeError;

/// Default salt length in bytes.
pub const DEFAULT_SALT_LEN: usize = 16;

/// Minimum allowed salt length in bytes.
pub const MIN_SALT_LEN: usize = 1;

/// Maximum allowed salt length in bytes.
pub const MAX_SALT_LEN: usize = 64;

/// Content type for data leaves (JSON payload, hex-encoded on the wire).
pub const LEAF_CONTENT_TYPE: &str = "json; encoding=hex";

/// Content type for the header leaf (index 0).
pub const HEADER_LEAF_CONTENT_TYPE: &str = "header+json; encoding=hex";

/// A single leaf of a hash tree.
///
/// Invariant: `data` and `salt` are both present (revealed) or both absent
/// (redacted). The hash is always present and never changes after build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// The leaf plaintext (JSON bytes), absent when redacted.
    pub data: Option<Vec<u8>>,

    /// The random salt, absent when redacted.
    pub salt: Option<Vec<u8>>,

    /// SHA-256 of `salt || data`, fixed at build time.
    pub hash: Sha256Digest,

    /// Tag recording the leaf role and data encoding.
    pub content_type: String,
}

impl Leaf {
    /// Build a revealed leaf over a JSON value with a fresh random salt.
    ///
    /// Returns `InvalidSaltLength` if `salt_len` is outside 1..=64.
    pub fn new(
        value: &serde_json::Value,
        salt_len: usize,
        content_type: &str,
    ) -> Result<Self, TreeError> {
        if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&salt_len) {
            return Err(TreeError::InvalidSaltLength {
                got: salt_len,
                min: MIN_SALT_LEN,
                max: MAX_SALT_LEN,
            });
        }

        let data = serde_json::to_vec(value)
            .map_err(|e| TreeError::MalformedLeaf(format!("unserializable value: {e}")))?;
        let mut salt = vec![0u8; salt_len];
        rand::thread_rng().fill_bytes(&mut salt);

        Ok(Self::from_parts(data, salt, content_type))
    }

    /// Build a revealed leaf from explicit data and salt bytes.
    ///
    /// Used by deterministic builders (golden vectors). The hash is
    /// computed here; callers cannot supply one.
    pub fn from_parts(data: Vec<u8>, salt: Vec<u8>, content_type: &str) -> Self {
        let hash = Sha256Digest::hash_parts([salt.as_slice(), data.as_slice()]);
        Self {
            data: Some(data),
            salt: Some(salt),
            hash,
            content_type: content_type.to_string(),
        }
    }

    /// Whether this leaf has been redacted (hash only).
    pub fn is_redacted(&self) -> bool {
        self.data.is_none()
    }

    /// Produce a redacted copy: data and salt cleared, hash and content
    /// type untouched.
    pub fn redacted(&self) -> Leaf {
        Leaf {
            data: None,
            salt: None,
            hash: self.hash,
            content_type: self.content_type.clone(),
        }
    }

    /// Recompute `SHA256(salt || data)` and compare to the stored hash.
    ///
    /// Always true for redacted leaves: with no data there is nothing to
    /// cross-check.
    pub fn matches_hash(&self) -> bool {
        match (&self.salt, &self.data) {
            (Some(salt), Some(data)) => {
                Sha256Digest::hash_parts([salt.as_slice(), data.as_slice()]) == self.hash
            }
            _ => true,
        }
    }

    /// Parse the leaf plaintext back into a JSON value.
    ///
    /// Returns `Ok(None)` for redacted leaves and `MalformedLeaf` when the
    /// data is not recoverable JSON.
    pub fn value(&self) -> Result<Option<serde_json::Value>, TreeError> {
        match &self.data {
            None => Ok(None),
            Some(data) => serde_json::from_slice(data)
                .map(Some)
                .map_err(|e| TreeError::MalformedLeaf(format!("data is not valid JSON: {e}"))),
        }
    }
}

/// Wire form of a leaf: hex-string fields, data/salt omitted when redacted.
#[derive(Serialize, Deserialize)]
struct LeafWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    salt: Option<String>,
    hash: String,
    #[serde(rename = "contentType")]
    content_type: String,
}

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = LeafWire {
            data: self.data.as_deref().map(encode_hex),
            salt: self.salt.as_deref().map(encode_hex),
            hash: self.hash.to_hex(),
            content_type: self.content_type.clone(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Leaf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = LeafWire::deserialize(deserializer)?;

        // data and salt must be revealed together or absent together
        let (data, salt) = match (wire.data, wire.salt) {
            (Some(d), Some(s)) => {
                let data = decode_hex(&d).map_err(serde::de::Error::custom)?;
                let salt = decode_hex(&s).map_err(serde::de::Error::custom)?;
                (Some(data), Some(salt))
            }
            (None, None) => (None, None),
            _ => {
                return Err(serde::de::Error::custom(TreeError::MalformedLeaf(
                    "data and salt must be present together or absent together".into(),
                )))
            }
        };

        let hash = Sha256Digest::from_hex(&wire.hash).map_err(serde::de::Error::custom)?;

        Ok(Leaf {
            data,
            salt,
            hash,
            content_type: wire.content_type,
        })
    }
}
