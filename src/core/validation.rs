//! Input validation for secret keys.
//!
//! Keys fetched from the store become template placeholder names, so they
//! are held to the identifier grammar before anything is merged.

use crate::error::{Result, ValidationError};

/// Validate a secret key name fetched from `path`.
///
/// Secret keys must be valid placeholder identifiers:
/// - Only A-Z, a-z, 0-9, and underscore
/// - Cannot start with a digit
/// - Cannot be empty
///
/// # Errors
///
/// Returns `ValidationError::InvalidKey` naming the key and the path it came from.
pub fn validate_key(key: &str, path: &str) -> Result<()> {
    let invalid = |reason: String| ValidationError::InvalidKey {
        key: key.to_string(),
        path: path.to_string(),
        reason,
    };

    let Some(first_char) = key.chars().next() else {
        return Err(invalid("key is empty".to_string()).into());
    };

    if first_char.is_ascii_digit() {
        return Err(invalid("cannot start with a digit".to_string()).into());
    }

    for (i, ch) in key.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(invalid(format!(
                "invalid character '{}' at position {}. Only letters, digits, and underscore are allowed",
                ch.escape_debug(),
                i + 1
            ))
            .into());
        }
    }

    Ok(())
}

/// Whether `key` is a valid placeholder identifier.
pub fn is_valid_key(key: &str) -> bool {
    validate_key(key, "").is_ok()
}
