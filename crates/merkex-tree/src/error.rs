//! Error types for tree construction and verification.

use thiserror::Error;

/// Errors that can occur while building, parsing, or verifying a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("input object has no properties")]
    EmptyInput,

    #[error("input is not a JSON object")]
    NotAnObject,

    #[error("salt length {got} outside allowed range {min}..={max}")]
    InvalidSaltLength { got: usize, min: usize, max: usize },

    #[error("malformed leaf: {0}")]
    MalformedLeaf(String),

    #[error("header leaf declares {declared} leaves, tree has {actual}")]
    HeaderTamper { declared: usize, actual: usize },

    #[error("leaf {index} data does not match its hash")]
    LeafTampered { index: usize },

    #[error("root mismatch: stored {stored}, computed {computed}")]
    RootMismatch { stored: String, computed: String },

    #[error("leaf index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("the header leaf cannot be redacted")]
    HeaderNotRedactable,

    #[error("decoding error: {0}")]
    Decoding(String),
}
