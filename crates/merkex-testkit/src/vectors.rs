//! Golden vectors: fixed salts, known objects, precomputed digests.
//!
//! Any implementation of the tree format, in any language, must reproduce
//! these roots byte for byte. Salts are deterministic per leaf index so
//! the vectors stay stable.

use merkex_tree::{MerkleTree, MerkleTreeBuilder, TreeError};
use serde_json::Value;

/// The fixed salt for a leaf index: sixteen bytes of `0xA0 + index`.
pub fn fixed_salt(index: usize) -> Vec<u8> {
    vec![0xA0u8.wrapping_add(index as u8); 16]
}

/// One conformance vector.
pub struct GoldenVector {
    pub name: &'static str,

    /// The source object, compact JSON.
    pub object_json: &'static str,

    /// Expected root, unprefixed hex.
    pub root_hex: &'static str,

    /// Expected per-leaf hashes in order, header leaf first.
    pub leaf_hashes: &'static [&'static str],
}

impl GoldenVector {
    /// Build the tree for this vector with its fixed salts.
    pub fn build(&self) -> Result<MerkleTree, TreeError> {
        let object: Value = serde_json::from_str(self.object_json)
            .map_err(|e| TreeError::MalformedLeaf(e.to_string()))?;
        MerkleTreeBuilder::new().build_with_salts(&object, fixed_salt)
    }
}

/// The conformance suite.
pub fn golden_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "person",
            object_json: r#"{"name":"John Doe","age":30,"country":"US"}"#,
            root_hex: "f5b9c18f71ba82eafe0d3a7f7fdc416bf8dcbab0e71d0213aaf88323411aab6e",
            leaf_hashes: &[
                "a5f2a8494b99d54479ea8f99dc9419cc2650d525a687d0b8130ae178849f91c6",
                "32c0e87c08ef9714ebc410bc38dc9300b3510d2447db0cbf72b3bbe53294205f",
                "7d3ceb61136e14a9e7b22a5b77afdf20e53bd8e7e914c577ae3b4346841584bc",
                "399c611ab729bffcdd66e4137ac71151aeb5518b814381aa5cc66e38073c0e98",
            ],
        },
        GoldenVector {
            name: "single-property",
            object_json: r#"{"email":"ada@example.org"}"#,
            root_hex: "1cc57a0ea712b22b8b524aa2578f7cb2711a38409d15f064589c1da5205a8e99",
            leaf_hashes: &[
                "7764f3db06846b2429ff3e179dc7f689f71184d744429617389b82a7dcd576b2",
                "984878863fcd2d2d58ff38a8706449a7658c2aefe9099dd8d96c6f7587fab583",
            ],
        },
        GoldenVector {
            name: "mixed-value-types",
            object_json: r#"{"id":7,"active":true,"tags":["a","b"],"meta":null}"#,
            root_hex: "4daefabba0280b5a2f6b33313f248377b903fd12bef56c7ca725643f13fe8bd8",
            leaf_hashes: &[
                "f1dce95cc4c1e6be00304961c5d4014d6191f2e26b97983baf57f48e429af534",
                "6f7236d15a81098eebb1b71ae40010a4cde2b72be3b70ed0804bd3d71419f244",
                "a60e9c38d21f3de872464cf8b171b3f26df80683886dc93caadca0659bcbc620",
                "cd6160950e46b778f67c6a0259bb02d890ba2bea6fa69edde3d49ba91dae550c",
                "b8d95c93993b22ab42d4d24ef6f9289ef5806b41cd5554d82c89f747837de3e8",
            ],
        },
    ]
}
