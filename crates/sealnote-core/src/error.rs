//! Error types for Sealnote core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these to
//! user-friendly messages. No variant ever carries plaintext or key material.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Sealnote operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Core error type for Sealnote operations.
#[derive(Debug, Error)]
pub enum NoteError {
    /// Wrong password or corrupted envelope. The two causes are
    /// deliberately indistinguishable.
    #[error("Decryption failed: wrong password or corrupted note")]
    Decryption,

    /// Malformed on-disk envelope record. Only surfaces from the envelope
    /// parser itself; codec entry points report it as `Decryption`.
    #[error("Malformed envelope: {0}")]
    EnvelopeParse(String),

    /// A second staging session was about to be created for one note.
    #[error("Staging session conflict for {}", .0.display())]
    SessionConflict(PathBuf),

    /// The note has no live staging session.
    #[error("No staging session for {}", .0.display())]
    SessionNotFound(PathBuf),

    /// Another session, possibly in another process, holds the note's claim.
    #[error("{} is already open in another session (claim {})", .path.display(), .claim.display())]
    AlreadyOpen { path: PathBuf, claim: PathBuf },

    /// No encrypted note exists at the path.
    #[error("Note not found: {}", .0.display())]
    NoteNotFound(PathBuf),

    /// An encrypted note already exists at the path.
    #[error("Note already exists: {}", .0.display())]
    NoteExists(PathBuf),

    /// Filesystem failure, annotated with the operation and path.
    #[error("I/O error during {op} of {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encryption or key-derivation setup failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// Version control collaborator failure
    #[error("Version control error: {0}")]
    Vcs(String),
}

impl NoteError {
    /// Annotate an I/O error with the operation and path it came from.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NoteError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the password was wrong or the note corrupted.
    pub fn is_decryption(&self) -> bool {
        matches!(self, NoteError::Decryption)
    }
}

impl From<tokio::task::JoinError> for NoteError {
    fn from(err: tokio::task::JoinError) -> Self {
        NoteError::Task(err.to_string())
    }
}
