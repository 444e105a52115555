//! Forward-script fingerprints

use sha2::{Digest, Sha256};

/// SHA-256 of the script text, lowercase hex.
///
/// Stable across restarts and independent of dialect: the same string always
/// yields the same checksum.
pub fn checksum(script: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(script.as_bytes());
    hex::encode(hasher.finalize())
}
