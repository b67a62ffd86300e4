//! Filesystem abstraction and atomic write utilities.
//!
//! The staging lifecycle only touches the disk through [`Filesystem`], so
//! tests can inject failures and embedders can redirect storage.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Filesystem operations needed by the note store.
///
/// `write_atomic` must guarantee that a concurrent reader observes either the
/// previous contents or the new contents, never a partial write.
pub trait Filesystem: Send + Sync {
    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace a file's contents atomically, creating parent directories.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Create a file that must not exist yet, creating parent directories.
    ///
    /// Fails with `io::ErrorKind::AlreadyExists` if it does.
    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Remove a file.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Recursively list regular files under `root`, skipping hidden entries.
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    /// Remove a directory and everything in it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by the local disk.
///
/// Files are written with owner-only permissions on unix.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let temp_path = parent.join(format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            Uuid::new_v4().simple()
        ));

        if let Err(err) = write_new_private(&temp_path, contents) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        rename_with_fallback(&temp_path, path)
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_new_private(path, contents)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_files(root, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

fn write_new_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}

/// Rename a temp file over `destination`.
///
/// On unix `rename` replaces the destination atomically, so a failure leaves
/// the destination untouched. Windows refuses to rename over an existing
/// file; there the destination is removed and the rename retried.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails (after the retry on Windows).
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    let Err(initial_err) = fs::rename(temp_path, destination) else {
        return Ok(());
    };

    #[cfg(windows)]
    {
        let _ = fs::remove_file(destination);
        if let Err(retry_err) = fs::rename(temp_path, destination) {
            let _ = fs::remove_file(temp_path);
            return Err(io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            ));
        }
        Ok(())
    }

    #[cfg(not(windows))]
    {
        let _ = fs::remove_file(temp_path);
        Err(io::Error::new(
            initial_err.kind(),
            format!("Atomic rename failed: {}", initial_err),
        ))
    }
}
