//! Base64 helpers for the envelope wire format.
//!
//! Output is always base64url without padding. Parsing is tolerant:
//! signatures produced by other stacks arrive in url-safe or standard
//! alphabets, padded or not, and all four forms decode.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::EnvelopeError;

/// Encode bytes as base64url without padding.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode strict base64url without padding.
pub fn decode(s: &str) -> Result<Vec<u8>, EnvelopeError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| EnvelopeError::Encoding(format!("invalid base64url: {e}")))
}

/// Decode accepting url-safe or standard alphabets, padded or unpadded.
pub fn decode_flexible(s: &str) -> Result<Vec<u8>, EnvelopeError> {
    URL_SAFE_NO_PAD
        .decode(s)
        .or_else(|_| URL_SAFE.decode(s))
        .or_else(|_| STANDARD.decode(s))
        .or_else(|_| STANDARD_NO_PAD.decode(s))
        .map_err(|e| EnvelopeError::Encoding(format!("invalid base64: {e}")))
}
