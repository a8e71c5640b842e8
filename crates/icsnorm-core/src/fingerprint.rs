//! Content fingerprints for cache validation.

use sha2::{Digest, Sha256};

/// Computes a strong `ETag` for the serialized bytes.
///
/// The value is the hex-encoded SHA-256 digest wrapped in double quotes.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Returns true if a conditional request token matches `fingerprint`.
///
/// The token is compared after trimming surrounding whitespace.
#[must_use]
pub fn matches_if_none_match(token: &str, fingerprint: &str) -> bool {
    token.trim() == fingerprint
}
