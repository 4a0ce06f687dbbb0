//! Identifier validation for map and axis names.

use crate::{Error, Result};

/// `true` if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Fail with a validation error unless `name` is identifier-safe.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} name must be a valid identifier ([A-Za-z_][A-Za-z0-9_]*), got {:?}",
            kind, name
        )))
    }
}
