//! Key derivation using Argon2id.
//!
//! Every note in every collection derives its key from the password alone:
//! the salt is a scheme-wide constant, so the same password always yields the
//! same key and envelopes stay self-describing.

use argon2::Argon2;
use zeroize::ZeroizeOnDrop;

use crate::error::{NoteError, Result};

/// Argon2id parameters.
///
/// Fixed for the whole scheme; changing any of them makes existing stores
/// unreadable.
/// - Memory: 19 MiB (19456 KiB)
/// - Iterations: 2
/// - Parallelism: 1
pub const ARGON2_MEMORY_KB: u32 = 19 * 1024;
pub const ARGON2_ITERATIONS: u32 = 2;
pub const ARGON2_PARALLELISM: u32 = 1;

/// Scheme-wide salt.
pub const SCHEME_SALT: &[u8; 16] = b"sealnote.v1.salt";

/// Length of derived key in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// A cryptographic key derived from a password.
///
/// Key material is zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive the note key for a password using Argon2id and the scheme salt.
///
/// Deliberately expensive (~19 MiB of memory per call) to slow offline
/// password guessing. Callers on an async runtime should run this on a
/// blocking thread.
///
/// # Examples
///
/// ```
/// use sealnote_core::crypto::derive_key;
///
/// let key = derive_key("correct-horse").unwrap();
/// assert_eq!(key.as_bytes().len(), 32);
/// ```
pub fn derive_key(password: &str) -> Result<DerivedKey> {
    let params = argon2::Params::new(
        ARGON2_MEMORY_KB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(KEY_LENGTH),
    )
    .map_err(|e| NoteError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key_bytes = [0u8; KEY_LENGTH];
    argon2
        .hash_password_into(password.as_bytes(), SCHEME_SALT, &mut key_bytes)
        .map_err(|e| NoteError::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(DerivedKey::from_bytes(key_bytes))
}
