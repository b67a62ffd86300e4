//! Key derivation for Sealnote.
//!
//! - **Argon2id**: memory-hard key derivation from the collection password
//! - Derived keys are zeroized from memory on drop
//! - Passwords are never stored
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the encrypted note files (including via a VCS remote)
//! - Offline brute-force attacks on the password
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Reading a staging copy while a note is open for editing

pub mod key;
pub mod password;

pub use key::{derive_key, DerivedKey, KEY_LENGTH};
pub use password::validate_new_password;
