//! Extension layout of a note collection.
//!
//! The extension is the only thing that tells ciphertext from plaintext on
//! disk: envelopes always carry `encrypted_extension`, staging copies always
//! carry `display_extension`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NoteError, Result};

pub const DEFAULT_ENCRYPTED_EXTENSION: &str = "enc";
pub const DEFAULT_DISPLAY_EXTENSION: &str = "md";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteLayout {
    encrypted_extension: String,
    display_extension: String,
}

impl Default for NoteLayout {
    fn default() -> Self {
        Self {
            encrypted_extension: DEFAULT_ENCRYPTED_EXTENSION.to_string(),
            display_extension: DEFAULT_DISPLAY_EXTENSION.to_string(),
        }
    }
}

impl NoteLayout {
    /// Build a layout; a leading dot on either extension is ignored.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::InvalidInput` if an extension is empty, contains a
    /// path separator, or both extensions are the same.
    pub fn new(encrypted_extension: &str, display_extension: &str) -> Result<Self> {
        let encrypted = normalize_extension(encrypted_extension)?;
        let display = normalize_extension(display_extension)?;
        if encrypted.eq_ignore_ascii_case(&display) {
            return Err(NoteError::InvalidInput(format!(
                "Encrypted and display extensions must differ (both are '{}')",
                encrypted
            )));
        }
        Ok(Self {
            encrypted_extension: encrypted,
            display_extension: display,
        })
    }

    pub fn encrypted_extension(&self) -> &str {
        &self.encrypted_extension
    }

    pub fn display_extension(&self) -> &str {
        &self.display_extension
    }

    /// Whether `path` names an encrypted note.
    pub fn is_encrypted(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.encrypted_extension))
    }

    /// Whether `path` names a plaintext (display) file.
    pub fn is_display(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.display_extension))
    }

    /// Persistent path for a note name, with or without an extension.
    pub fn encrypted_path(&self, name: &Path) -> PathBuf {
        if self.is_encrypted(name) {
            name.to_path_buf()
        } else if self.is_display(name) {
            name.with_extension(&self.encrypted_extension)
        } else {
            let mut file_name = name.as_os_str().to_owned();
            file_name.push(".");
            file_name.push(&self.encrypted_extension);
            PathBuf::from(file_name)
        }
    }

    /// File name of the staging copy for an encrypted note.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::InvalidInput` if `persistent` is not an encrypted note path.
    pub fn staging_file_name(&self, persistent: &Path) -> Result<PathBuf> {
        self.ensure_encrypted(persistent)?;
        let stem = persistent.file_stem().ok_or_else(|| {
            NoteError::InvalidInput(format!("{} has no file name", persistent.display()))
        })?;
        let mut file_name = stem.to_owned();
        file_name.push(".");
        file_name.push(&self.display_extension);
        Ok(PathBuf::from(file_name))
    }

    /// Display name of a note: its path relative to `root`, without the encrypted extension.
    pub fn note_name(&self, root: &Path, persistent: &Path) -> String {
        let relative = persistent.strip_prefix(root).unwrap_or(persistent);
        let name = if self.is_encrypted(relative) {
            relative.with_extension("")
        } else {
            relative.to_path_buf()
        };
        name.to_string_lossy().replace('\\', "/")
    }

    pub(crate) fn ensure_encrypted(&self, persistent: &Path) -> Result<()> {
        if self.is_encrypted(persistent) {
            Ok(())
        } else {
            Err(NoteError::InvalidInput(format!(
                "{} is not an encrypted note (expected .{} extension)",
                persistent.display(),
                self.encrypted_extension
            )))
        }
    }
}

fn normalize_extension(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(NoteError::InvalidInput(
            "File extension cannot be empty".to_string(),
        ));
    }
    if trimmed.contains(|c: char| c == '/' || c == '\\') {
        return Err(NoteError::InvalidInput(format!(
            "File extension '{}' cannot contain a path separator",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = NoteLayout::default();
        assert_eq!(layout.encrypted_extension(), "enc");
        assert_eq!(layout.display_extension(), "md");
    }

    #[test]
    fn test_new_strips_leading_dot() {
        let layout = NoteLayout::new(".secret", ".txt").unwrap();
        assert_eq!(layout.encrypted_extension(), "secret");
        assert_eq!(layout.display_extension(), "txt");
    }

    #[test]
    fn test_new_rejects_same_or_empty_extensions() {
        assert!(NoteLayout::new("md", "md").is_err());
        assert!(NoteLayout::new("", "md").is_err());
        assert!(NoteLayout::new("enc", ".").is_err());
        assert!(NoteLayout::new("a/b", "md").is_err());
    }

    #[test]
    fn test_staging_file_name_swaps_extension() {
        let layout = NoteLayout::default();
        let name = layout
            .staging_file_name(Path::new("/notes/work/plan.v2.enc"))
            .unwrap();
        assert_eq!(name, PathBuf::from("plan.v2.md"));
    }

    #[test]
    fn test_staging_file_name_rejects_plaintext_path() {
        let layout = NoteLayout::default();
        assert!(layout.staging_file_name(Path::new("/notes/plan.md")).is_err());
        assert!(layout.staging_file_name(Path::new("/notes/plan")).is_err());
    }

    #[test]
    fn test_encrypted_path_for_names() {
        let layout = NoteLayout::default();
        assert_eq!(layout.encrypted_path(Path::new("todo")), PathBuf::from("todo.enc"));
        assert_eq!(layout.encrypted_path(Path::new("todo.enc")), PathBuf::from("todo.enc"));
        assert_eq!(layout.encrypted_path(Path::new("todo.md")), PathBuf::from("todo.enc"));
        assert_eq!(
            layout.encrypted_path(Path::new("v1.2")),
            PathBuf::from("v1.2.enc")
        );
    }

    #[test]
    fn test_note_name_is_relative_without_extension() {
        let layout = NoteLayout::default();
        let name = layout.note_name(Path::new("/notes"), Path::new("/notes/work/plan.enc"));
        assert_eq!(name, "work/plan");
    }
}
