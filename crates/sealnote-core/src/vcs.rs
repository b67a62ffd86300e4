//! Version control collaborator.
//!
//! The store never calls a VCS on its own. Front ends decide when a sealed
//! change should be recorded and drive an implementation of
//! [`VersionControl`]; only encrypted files are ever handed to it.

use std::path::{Path, PathBuf};

use crate::error::{NoteError, Result};

/// A repository that can record changes to the note collection.
pub trait VersionControl: Send + Sync {
    /// Prepare `root` as a repository. Must be a no-op if it already is one.
    fn init(&self, root: &Path) -> Result<()>;

    /// Record the current state of `paths` with `message`.
    ///
    /// Returns `false` when there was nothing to record.
    fn commit(&self, root: &Path, paths: &[PathBuf], message: &str) -> Result<bool>;

    /// Publish recorded changes to the configured remote.
    fn push(&self, root: &Path) -> Result<()>;
}

/// Commit message for a change to one note.
pub fn commit_message(action: &str, note_name: &str) -> String {
    format!("{} {}", action, note_name)
}

/// Refuse to hand anything but sealed notes to a repository.
pub fn ensure_sealed_paths(paths: &[PathBuf], encrypted_extension: &str) -> Result<()> {
    for path in paths {
        let sealed = path
            .extension()
            .is_some_and(|ext| ext == encrypted_extension);
        if !sealed {
            return Err(NoteError::Vcs(format!(
                "refusing to record non-encrypted file {}",
                path.display()
            )));
        }
    }
    Ok(())
}
