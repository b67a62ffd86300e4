//! Authenticated encryption of note contents.
//!
//! AES-256-GCM under a key derived from the password with Argon2id. Every
//! encryption draws a fresh random 96-bit nonce, so sealing the same text
//! twice yields unrelated envelopes. The tag is verified before any plaintext
//! is released; a wrong password and a corrupted envelope fail identically.

pub mod envelope;

use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use zeroize::Zeroizing;

use crate::crypto::{derive_key, DerivedKey};
use crate::error::{NoteError, Result};

pub use envelope::{EncryptedEnvelope, NONCE_LENGTH, TAG_LENGTH};

/// Stateless envelope codec.
///
/// `encrypt`/`decrypt` run the key derivation on every call. Callers that
/// process several notes with one password can derive once and use
/// `seal`/`unseal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CipherCodec;

impl CipherCodec {
    pub fn new() -> Self {
        Self
    }

    /// Derive the note key for `password`.
    pub fn derive_key(&self, password: &str) -> Result<DerivedKey> {
        derive_key(password)
    }

    /// Encrypt `plaintext` under `password` into a fresh envelope.
    ///
    /// # Examples
    ///
    /// ```
    /// use sealnote_core::CipherCodec;
    ///
    /// let codec = CipherCodec::new();
    /// let envelope = codec.encrypt(b"# hello\n\nbody", "correct-horse").unwrap();
    /// let plaintext = codec.decrypt(&envelope, "correct-horse").unwrap();
    /// assert_eq!(plaintext.as_slice(), b"# hello\n\nbody");
    /// ```
    pub fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<EncryptedEnvelope> {
        let key = self.derive_key(password)?;
        self.seal(plaintext, &key)
    }

    /// Decrypt an envelope with `password`.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::Decryption` if the password is wrong or the
    /// envelope was modified.
    pub fn decrypt(&self, envelope: &EncryptedEnvelope, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.derive_key(password)?;
        self.unseal(envelope, &key)
    }

    /// Parse note file bytes and decrypt them.
    ///
    /// A malformed record is reported as `NoteError::Decryption`, exactly
    /// like a failed tag check.
    pub fn decrypt_bytes(&self, bytes: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>> {
        let envelope = EncryptedEnvelope::from_slice(bytes).map_err(|err| {
            log::debug!("rejecting note file: {}", err);
            NoteError::Decryption
        })?;
        self.decrypt(&envelope, password)
    }

    /// Encrypt `plaintext` with an already derived key.
    pub fn seal(&self, plaintext: &[u8], key: &DerivedKey) -> Result<EncryptedEnvelope> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // Zeroized if encryption bails out with plaintext still in the buffer.
        let mut buffer = Zeroizing::new(plaintext.to_vec());
        let tag = cipher
            .encrypt_in_place_detached(&nonce, b"", buffer.as_mut_slice())
            .map_err(|_| NoteError::Crypto("AES-GCM encryption failed".to_string()))?;
        let ciphertext = std::mem::take(&mut *buffer);

        Ok(EncryptedEnvelope::from_parts(nonce.into(), ciphertext, tag.into()))
    }

    /// Decrypt an envelope with an already derived key.
    pub fn unseal(&self, envelope: &EncryptedEnvelope, key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        let mut buffer = Zeroizing::new(envelope.ciphertext().to_vec());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(envelope.nonce()),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(envelope.auth_tag()),
            )
            .map_err(|_| NoteError::Decryption)?;

        Ok(buffer)
    }
}
