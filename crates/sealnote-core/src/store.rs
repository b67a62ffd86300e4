//! A configured note collection.
//!
//! [`NoteStore`] binds a storage root and a [`NoteLayout`] to a
//! [`StagingManager`]. Front ends address notes by name (`work/plan`); the
//! store turns names into persistent paths and delegates the staging
//! lifecycle.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task;
use zeroize::Zeroizing;

use crate::codec::CipherCodec;
use crate::error::{NoteError, Result};
use crate::fs::{Filesystem, LocalFilesystem};
use crate::staging::{NoteLayout, SessionInfo, Staged, StagingManager, WatchHandle};

/// One encrypted note in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    /// Path relative to the root, without the encrypted extension.
    pub name: String,
    pub path: PathBuf,
    /// Size of the envelope on disk, in bytes.
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Open for editing here or in another process sharing the staging root.
    pub staged: bool,
}

pub struct NoteStore {
    root: PathBuf,
    fs: Arc<dyn Filesystem>,
    codec: CipherCodec,
    staging: StagingManager,
}

impl NoteStore {
    pub fn new(
        root: impl Into<PathBuf>,
        layout: NoteLayout,
        staging_root: impl Into<PathBuf>,
        fs: Arc<dyn Filesystem>,
    ) -> Self {
        Self {
            root: root.into(),
            staging: StagingManager::new(Arc::clone(&fs), layout, staging_root),
            codec: CipherCodec::new(),
            fs,
        }
    }

    /// Store on the local disk.
    pub fn local(
        root: impl Into<PathBuf>,
        layout: NoteLayout,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Self::new(root, layout, staging_root, Arc::new(LocalFilesystem))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &NoteLayout {
        self.staging.layout()
    }

    pub fn staging(&self) -> &StagingManager {
        &self.staging
    }

    /// Map a note name to its persistent path under the root.
    ///
    /// The name may carry the encrypted or display extension, or none.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::InvalidInput` for empty or absolute names and for
    /// names that would escape the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(NoteError::InvalidInput("Note name cannot be empty".to_string()));
        }
        let relative = Path::new(trimmed);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(NoteError::InvalidInput(format!(
                        "Note name '{}' cannot contain '..'",
                        trimmed
                    )))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(NoteError::InvalidInput(format!(
                        "Note name '{}' must be relative to the collection",
                        trimmed
                    )))
                }
            }
        }
        Ok(self.root.join(self.layout().encrypted_path(relative)))
    }

    /// Display name for a persistent path.
    pub fn name_of(&self, persistent: &Path) -> String {
        self.layout().note_name(&self.root, persistent)
    }

    /// Every encrypted note under the root, sorted by name.
    pub async fn list(&self) -> Result<Vec<NoteEntry>> {
        let fs = Arc::clone(&self.fs);
        let root = self.root.clone();
        let layout = self.layout().clone();
        let files = task::spawn_blocking(move || -> Result<Vec<(PathBuf, u64, Option<DateTime<Utc>>)>> {
            if !root.is_dir() {
                return Ok(Vec::new());
            }
            let files = fs
                .list_files(&root)
                .map_err(|e| NoteError::io("list", &root, e))?;
            Ok(files
                .into_iter()
                .filter(|path| layout.is_encrypted(path))
                .map(|path| {
                    let metadata = std::fs::metadata(&path).ok();
                    let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
                    let modified = metadata
                        .and_then(|m| m.modified().ok())
                        .map(DateTime::<Utc>::from);
                    (path, size, modified)
                })
                .collect())
        })
        .await??;

        let mut entries = Vec::with_capacity(files.len());
        for (path, size, modified) in files {
            entries.push(NoteEntry {
                name: self.name_of(&path),
                staged: self.staging.is_staged(&path).await
                    || self.staging.is_claimed(&path).await,
                path,
                size,
                modified,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Seal a new note with `initial` content.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::NoteExists` if the note is already present.
    pub async fn create(&self, name: &str, initial: &[u8], password: &str) -> Result<PathBuf> {
        let path = self.resolve(name)?;
        let fs = Arc::clone(&self.fs);
        let codec = self.codec;
        let password = Zeroizing::new(password.to_string());
        let initial = Zeroizing::new(initial.to_vec());
        let target = path.clone();
        task::spawn_blocking(move || {
            if fs.exists(&target) {
                return Err(NoteError::NoteExists(target));
            }
            let envelope = codec.encrypt(&initial, &password)?;
            fs.write_atomic(&target, &envelope.to_bytes())
                .map_err(|e| NoteError::io("write", &target, e))
        })
        .await??;

        log::info!("Created {}", path.display());
        Ok(path)
    }

    /// Decrypt a note into memory without staging it.
    pub async fn read(&self, name: &str, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        let path = self.resolve(name)?;
        let fs = Arc::clone(&self.fs);
        let codec = self.codec;
        let password = Zeroizing::new(password.to_string());
        task::spawn_blocking(move || {
            if !fs.exists(&path) {
                return Err(NoteError::NoteNotFound(path));
            }
            let bytes = fs
                .read(&path)
                .map_err(|e| NoteError::io("read", &path, e))?;
            codec.decrypt_bytes(&bytes, &password)
        })
        .await?
    }

    pub async fn open(&self, name: &str, password: &str) -> Result<Staged> {
        let path = self.resolve(name)?;
        self.staging.open(&path, password).await
    }

    pub async fn persist(&self, name: &str, password: &str) -> Result<()> {
        let path = self.resolve(name)?;
        self.staging.persist(&path, password).await
    }

    pub async fn close(&self, name: &str, password: &str) -> Result<()> {
        let path = self.resolve(name)?;
        self.staging.close(&path, password).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        self.staging.delete(&path).await
    }

    pub async fn watch(&self, name: &str, handle: WatchHandle) -> Result<()> {
        let path = self.resolve(name)?;
        self.staging.watch(&path, handle).await
    }

    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.staging.sessions().await
    }

    pub async fn close_all(&self, password: &str) -> Vec<(PathBuf, NoteError)> {
        self.staging.close_all(password).await
    }
}
