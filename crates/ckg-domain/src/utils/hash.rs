//! Content hashing helpers.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a string.
#[must_use]
pub fn sha256_hex(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
