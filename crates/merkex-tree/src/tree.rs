//! Hash tree engine: build, verify, and selectively disclose.
//!
//! A tree is an ordered sequence of leaves. Leaf 0 is a synthetic header
//! leaf whose plaintext declares the hash algorithm and the total leaf
//! count; every other leaf holds one top-level property of the source
//! object, in the object's declared key order. The root is the SHA-256 of
//! the leaf hashes concatenated in sequence order, which is what a
//! verifier re-derives after redaction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::digest::Sha256Digest;
use crate::error::TreeError;
use crate::leaf::{Leaf, DEFAULT_SALT_LEN, HEADER_LEAF_CONTENT_TYPE, LEAF_CONTENT_TYPE};

/// Hash algorithm identifier carried in the tree header and header leaf.
pub const TREE_HASH_ALG: &str = "SHA256";

/// Format version of the tree wire format.
pub const TREE_VERSION: &str = "1.0";

/// `typ` value of the tree header.
pub const TREE_TYP: &str = "MerkleTree+1.0";

/// Wire-level tree header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TreeHeader {
    fn default() -> Self {
        Self {
            alg: TREE_HASH_ALG.to_string(),
            typ: TREE_TYP.to_string(),
        }
    }
}

/// Plaintext of the header leaf: `{"alg":"SHA256","leaves":N}`.
///
/// `leaves` counts every leaf including the header leaf itself, so a
/// verifier can detect structural add/remove tampering before touching
/// any hashes.
#[derive(Debug, Serialize, Deserialize)]
struct HeaderLeafData {
    alg: String,
    leaves: usize,
}

/// A salted hash tree over a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleTree {
    /// Ordered leaves; index 0 is always the header leaf.
    pub leaves: Vec<Leaf>,

    /// SHA-256 over the concatenated leaf hashes, fixed at build time.
    pub root: Sha256Digest,

    /// Wire header (algorithm + format tag).
    pub header: TreeHeader,
}

/// Compute the root digest from an ordered leaf sequence.
pub fn compute_root(leaves: &[Leaf]) -> Sha256Digest {
    Sha256Digest::hash_parts(leaves.iter().map(|l| l.hash.as_bytes().as_slice()))
}

/// Builder for hash trees.
#[derive(Debug, Clone)]
pub struct MerkleTreeBuilder {
    salt_len: usize,
}

impl Default for MerkleTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleTreeBuilder {
    /// Start a builder with the default 16-byte salt.
    pub fn new() -> Self {
        Self {
            salt_len: DEFAULT_SALT_LEN,
        }
    }

    /// Set the salt length in bytes (validated at build: 1..=64).
    pub fn salt_length(mut self, salt_len: usize) -> Self {
        self.salt_len = salt_len;
        self
    }

    /// Build a tree from a flat JSON object with random salts.
    ///
    /// Leaf order is the header leaf followed by one leaf per top-level
    /// property in declared key order. Empty objects are rejected.
    pub fn build(&self, object: &Value) -> Result<MerkleTree, TreeError> {
        let salt_len = self.salt_len;
        self.build_inner(object, |value, content_type| {
            Leaf::new(value, salt_len, content_type)
        })
    }

    /// Build with caller-supplied salts, one per leaf index.
    ///
    /// Deterministic variant used for golden vectors and conformance
    /// testing across implementations. Salt lengths are still bounded.
    pub fn build_with_salts(
        &self,
        object: &Value,
        mut salt_for: impl FnMut(usize) -> Vec<u8>,
    ) -> Result<MerkleTree, TreeError> {
        let mut index = 0usize;
        self.build_inner(object, |value, content_type| {
            let salt = salt_for(index);
            index += 1;
            if !(crate::leaf::MIN_SALT_LEN..=crate::leaf::MAX_SALT_LEN).contains(&salt.len()) {
                return Err(TreeError::InvalidSaltLength {
                    got: salt.len(),
                    min: crate::leaf::MIN_SALT_LEN,
                    max: crate::leaf::MAX_SALT_LEN,
                });
            }
            let data = serde_json::to_vec(value)
                .map_err(|e| TreeError::MalformedLeaf(format!("unserializable value: {e}")))?;
            Ok(Leaf::from_parts(data, salt, content_type))
        })
    }

    fn build_inner(
        &self,
        object: &Value,
        mut make_leaf: impl FnMut(&Value, &str) -> Result<Leaf, TreeError>,
    ) -> Result<MerkleTree, TreeError> {
        let props = object.as_object().ok_or(TreeError::NotAnObject)?;
        if props.is_empty() {
            return Err(TreeError::EmptyInput);
        }

        let leaf_count = props.len() + 1;
        let header_value = serde_json::to_value(HeaderLeafData {
            alg: TREE_HASH_ALG.to_string(),
            leaves: leaf_count,
        })
        .map_err(|e| TreeError::MalformedLeaf(e.to_string()))?;

        let mut leaves = Vec::with_capacity(leaf_count);
        leaves.push(make_leaf(&header_value, HEADER_LEAF_CONTENT_TYPE)?);

        for (key, value) in props {
            let mut entry = serde_json::Map::new();
            entry.insert(key.clone(), value.clone());
            leaves.push(make_leaf(&Value::Object(entry), LEAF_CONTENT_TYPE)?);
        }

        let root = compute_root(&leaves);
        Ok(MerkleTree {
            leaves,
            root,
            header: TreeHeader::default(),
        })
    }
}

impl MerkleTree {
    /// Compute the root from the current leaf hashes without mutating.
    pub fn computed_root(&self) -> Sha256Digest {
        compute_root(&self.leaves)
    }

    /// Recompute and store the root from the current leaf hashes.
    ///
    /// Only needed after structural changes to the leaf sequence; plain
    /// redaction leaves the hashes, and therefore the root, unchanged.
    pub fn recompute_root(&mut self) {
        self.root = compute_root(&self.leaves);
    }

    /// Verify the tree.
    ///
    /// Check order: header leaf count first (cheap, before any hash
    /// comparison), then every revealed leaf against its stored hash, then
    /// the root against the leaf-hash sequence. A root match alone only
    /// proves the hash list is self-consistent, so revealed leaves are
    /// always cross-checked.
    pub fn verify(&self) -> Result<(), TreeError> {
        if self.leaves.is_empty() {
            return Err(TreeError::EmptyInput);
        }

        let declared = self.declared_leaf_count()?;
        if declared != self.leaves.len() {
            return Err(TreeError::HeaderTamper {
                declared,
                actual: self.leaves.len(),
            });
        }

        for (index, leaf) in self.leaves.iter().enumerate() {
            if !leaf.matches_hash() {
                return Err(TreeError::LeafTampered { index });
            }
        }

        let computed = self.computed_root();
        if computed != self.root {
            return Err(TreeError::RootMismatch {
                stored: self.root.to_hex(),
                computed: computed.to_hex(),
            });
        }

        Ok(())
    }

    /// Read the leaf count declared by the header leaf.
    fn declared_leaf_count(&self) -> Result<usize, TreeError> {
        let header_leaf = &self.leaves[0];
        let data = header_leaf
            .data
            .as_deref()
            .ok_or_else(|| TreeError::MalformedLeaf("header leaf is redacted".into()))?;
        let parsed: HeaderLeafData = serde_json::from_slice(data)
            .map_err(|e| TreeError::MalformedLeaf(format!("invalid header leaf: {e}")))?;
        Ok(parsed.leaves)
    }

    /// Produce a disclosure view with the given leaf indices redacted.
    ///
    /// The root is kept as originally computed; redaction never changes
    /// leaf hashes. Index 0 (the header leaf) cannot be redacted.
    pub fn redact_indices(&self, indices: &[usize]) -> Result<MerkleTree, TreeError> {
        for &index in indices {
            if index == 0 {
                return Err(TreeError::HeaderNotRedactable);
            }
            if index >= self.leaves.len() {
                return Err(TreeError::IndexOutOfRange(index));
            }
        }

        let mut view = self.clone();
        for &index in indices {
            view.leaves[index] = view.leaves[index].redacted();
        }
        Ok(view)
    }

    /// Produce a disclosure view revealing only the named properties.
    ///
    /// Every data leaf whose property key is not in `keys` is redacted.
    /// Already-redacted leaves stay redacted.
    pub fn disclose_only(&self, keys: &[&str]) -> Result<MerkleTree, TreeError> {
        let mut indices = Vec::new();
        for (index, leaf) in self.leaves.iter().enumerate().skip(1) {
            match property_key(leaf)? {
                Some(key) if keys.contains(&key.as_str()) => {}
                Some(_) => indices.push(index),
                None => {}
            }
        }
        self.redact_indices(&indices)
    }

    /// Merge the revealed data leaves back into a JSON object.
    ///
    /// Redacted properties are simply absent from the result.
    pub fn reconstruct(&self) -> Result<Value, TreeError> {
        let mut object = serde_json::Map::new();
        for leaf in self.leaves.iter().skip(1) {
            if let Some(value) = leaf.value()? {
                let pair = value
                    .as_object()
                    .filter(|m| m.len() == 1)
                    .ok_or_else(|| {
                        TreeError::MalformedLeaf(
                            "data leaf must hold exactly one property".into(),
                        )
                    })?;
                for (k, v) in pair {
                    object.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(Value::Object(object))
    }

    /// Serialize to the JSON wire format.
    pub fn to_json(&self) -> Result<String, TreeError> {
        serde_json::to_string(self).map_err(|e| TreeError::Decoding(e.to_string()))
    }

    /// Parse from the JSON wire format. Structural decode only; call
    /// [`verify`](Self::verify) to check integrity.
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        serde_json::from_str(json).map_err(|e| TreeError::Decoding(e.to_string()))
    }
}

/// Extract the property key of a data leaf, if revealed.
fn property_key(leaf: &Leaf) -> Result<Option<String>, TreeError> {
    match leaf.value()? {
        None => Ok(None),
        Some(value) => {
            let pair = value
                .as_object()
                .filter(|m| m.len() == 1)
                .ok_or_else(|| {
                    TreeError::MalformedLeaf("data leaf must hold exactly one property".into())
                })?;
            Ok(pair.keys().next().cloned())
        }
    }
}
