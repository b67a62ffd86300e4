//! # Sealnote Core
//!
//! Core library for Sealnote - a collection of text notes that are always
//! encrypted at rest and only exist in plaintext as short-lived, tracked
//! staging copies.
//!
//! This crate provides the encryption scheme, the staging lifecycle and the
//! filesystem/version-control seams, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: Argon2id key derivation and password validation
//! - **codec**: AES-256-GCM envelopes and their on-disk JSON form
//! - **staging**: Sealed/Staged lifecycle, one session per note
//! - **store**: A configured note collection (root + extensions)
//! - **fs**: Filesystem abstraction with atomic writes
//! - **vcs**: Version control collaborator interface

pub mod codec;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod staging;
pub mod store;
pub mod vcs;

pub use codec::{CipherCodec, EncryptedEnvelope};
pub use error::{NoteError, Result};
pub use fs::{Filesystem, LocalFilesystem};
pub use staging::{NoteLayout, SessionInfo, Staged, StagingManager, WatchHandle};
pub use store::{NoteEntry, NoteStore};
pub use vcs::VersionControl;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
