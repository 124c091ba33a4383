//! Collection-name sanitization.

use sha2::{Digest, Sha256};

/// Maximum length the backing store accepts for a collection name.
pub const MAX_COLLECTION_NAME_LEN: usize = 63;

/// Prefix applied to every derived collection name.
pub const COLLECTION_NAME_PREFIX: &str = "repo_";

/// Derive the backing-store collection name for a free-form repository name.
///
/// Lowercases, maps any non-`[a-z0-9_]` byte to `_`, collapses `_` runs,
/// strips leading/trailing `_`, prepends `repo_`, and truncates to 63
/// characters. When truncation occurs, the last 8 characters are replaced by
/// a hex digest fragment of the original name so distinct inputs stay
/// distinct.
///
/// The function is pure: equal inputs always produce equal outputs.
#[must_use]
pub fn sanitize_collection_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for ch in name.to_lowercase().chars() {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            ch
        } else {
            '_'
        };
        if mapped == '_' {
            if !last_was_underscore {
                cleaned.push('_');
            }
            last_was_underscore = true;
        } else {
            cleaned.push(mapped);
            last_was_underscore = false;
        }
    }
    let cleaned = cleaned.trim_matches('_');

    let mut result = format!("{COLLECTION_NAME_PREFIX}{cleaned}");
    if result.len() > MAX_COLLECTION_NAME_LEN {
        let digest = Sha256::digest(name.as_bytes());
        let suffix = hex::encode(&digest[..4]);
        result.truncate(MAX_COLLECTION_NAME_LEN - suffix.len());
        result.push_str(&suffix);
    }
    result
}
