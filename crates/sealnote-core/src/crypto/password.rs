//! Password validation.
//!
//! Encryption and decryption accept any password, including the empty one.
//! Only passwords chosen for a new collection must meet a minimum length.

use crate::error::{NoteError, Result};

/// Minimum password length in characters for a new collection.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate that a password chosen for a new collection is acceptable.
///
/// # Examples
///
/// ```
/// use sealnote_core::crypto::validate_new_password;
///
/// assert!(validate_new_password("correct-horse-battery").is_ok());
/// assert!(validate_new_password("short").is_err());
/// ```
pub fn validate_new_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(NoteError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(NoteError::InvalidInput(format!(
            "Password must be at least {} characters (got {})",
            MIN_PASSWORD_LENGTH, length
        )));
    }

    Ok(())
}
