//! Label and relationship-type validation.
//!
//! Labels and relationship types are interpolated into graph queries (they
//! cannot be bound as parameters), so every user-supplied value must match
//! `[A-Za-z][A-Za-z0-9_]*` before query composition. Anything else fails
//! validation and no query is issued.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Validate a node label.
///
/// # Errors
///
/// Returns `VALIDATION_ERROR` when the label does not match
/// `[A-Za-z][A-Za-z0-9_]*`.
pub fn validate_label(label: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(label) {
        Ok(())
    } else {
        Err(Error::validation(format!("invalid node label '{label}'")))
    }
}

/// Validate a relationship type.
///
/// # Errors
///
/// Returns `VALIDATION_ERROR` when the type does not match
/// `[A-Za-z][A-Za-z0-9_]*`.
pub fn validate_relationship_type(rel_type: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(rel_type) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "invalid relationship type '{rel_type}'"
        )))
    }
}
