//! Staging lifecycle: moving notes between their sealed and editable forms.
//!
//! Every note is either **Sealed** (only the envelope exists) or **Staged**
//! (a plaintext working copy exists and a session tracks it). The manager
//! guarantees at most one session per persistent path:
//!
//! - The registry maps each path to a slot behind an async mutex. All
//!   mutations of one note (`open`, `persist`, `close`, `delete`) hold that
//!   slot's lock for their whole duration, so they are totally ordered.
//! - The registry mutex itself is only held for map lookups, never across an
//!   await.
//! - A slot that becomes empty is marked retired and removed from the map
//!   while its lock is held. A task that wakes up holding a retired slot
//!   starts over, so two racing `open`s can never end up in different slots.
//! - Managers in separate processes share nothing but the staging root. A
//!   session also holds an exclusive claim file there, so a note staged by
//!   one process reports `AlreadyOpen` to every other.
//!
//! Key derivation, encryption and disk I/O run on tokio's blocking pool, so a
//! slow key derivation for one note never stalls work on another.

mod claim;
mod layout;
mod session;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::codec::CipherCodec;
use crate::error::{NoteError, Result};
use crate::fs::Filesystem;

pub use claim::is_claim_file;
pub use layout::{NoteLayout, DEFAULT_DISPLAY_EXTENSION, DEFAULT_ENCRYPTED_EXTENSION};
pub use session::{SessionInfo, Staged, WatchHandle};

use session::StagingSession;

type Slot = Arc<AsyncMutex<SlotState>>;
type SlotGuard = OwnedMutexGuard<SlotState>;

#[derive(Debug, Default)]
struct SlotState {
    session: Option<StagingSession>,
    retired: bool,
}

/// Owns every live staging session.
pub struct StagingManager {
    fs: Arc<dyn Filesystem>,
    codec: CipherCodec,
    layout: NoteLayout,
    staging_root: PathBuf,
    sessions: Mutex<HashMap<PathBuf, Slot>>,
}

impl StagingManager {
    /// Create a manager that stages plaintext copies under `staging_root`.
    pub fn new(fs: Arc<dyn Filesystem>, layout: NoteLayout, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            codec: CipherCodec::new(),
            layout,
            staging_root: staging_root.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn layout(&self) -> &NoteLayout {
        &self.layout
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Decrypt a note into a staging copy (Sealed -> Staged).
    ///
    /// Idempotent: if the note is already staged, the existing staging path
    /// is returned with `reused` set and nothing is decrypted.
    ///
    /// # Errors
    ///
    /// - `NoteError::NoteNotFound` if no envelope exists at `persistent`
    /// - `NoteError::AlreadyOpen` if another manager sharing the staging
    ///   root has the note staged
    /// - `NoteError::Decryption` for a wrong password or corrupted envelope
    /// - `NoteError::Io` if the envelope cannot be read or the copy written
    ///
    /// On any error the note stays Sealed and no staging artifact is left.
    pub async fn open(&self, persistent: &Path, password: &str) -> Result<Staged> {
        self.layout.ensure_encrypted(persistent)?;

        let (slot, mut state) = self.acquire_or_create(persistent).await;
        if let Some(session) = state.session.as_ref() {
            log::debug!("{} already staged", persistent.display());
            return Ok(Staged {
                staging_path: session.staging_path.clone(),
                reused: true,
            });
        }

        let session = match self.stage(persistent, password).await {
            Ok(session) => session,
            Err(err) => {
                self.retire(persistent, &slot, &mut state);
                return Err(err);
            }
        };

        let staged = Staged {
            staging_path: session.staging_path.clone(),
            reused: false,
        };
        self.install(&mut state, session).await?;
        log::info!(
            "Staged {} at {}",
            persistent.display(),
            staged.staging_path.display()
        );
        Ok(staged)
    }

    /// Re-encrypt the staging copy over the persistent note (Staged -> Staged).
    ///
    /// # Errors
    ///
    /// Returns `NoteError::SessionNotFound` if the note is not staged, or the
    /// underlying read/encrypt/write error. A failed persist leaves the
    /// previous envelope in place.
    pub async fn persist(&self, persistent: &Path, password: &str) -> Result<()> {
        let (_slot, mut state) = self
            .acquire_existing(persistent)
            .await
            .ok_or_else(|| NoteError::SessionNotFound(persistent.to_path_buf()))?;
        let session = state
            .session
            .as_mut()
            .ok_or_else(|| NoteError::SessionNotFound(persistent.to_path_buf()))?;
        self.seal_staging(session, password).await
    }

    /// Seal the note and destroy its staging copy (Staged -> Sealed).
    ///
    /// Runs a final persist so edits that were never explicitly saved are not
    /// lost, releases all watch handles, then deletes the staging copy. The
    /// session is removed from tracking whatever happens.
    ///
    /// # Errors
    ///
    /// - If the final persist fails, the error is returned and the staging
    ///   copy is kept on disk so its content survives.
    /// - If deleting the staging copy fails, the note is already sealed and
    ///   the cleanup error is returned.
    pub async fn close(&self, persistent: &Path, password: &str) -> Result<()> {
        let (slot, mut state) = self
            .acquire_existing(persistent)
            .await
            .ok_or_else(|| NoteError::SessionNotFound(persistent.to_path_buf()))?;
        let Some(session) = state.session.take() else {
            self.retire(persistent, &slot, &mut state);
            return Err(NoteError::SessionNotFound(persistent.to_path_buf()));
        };

        let result = self.teardown(session, Some(password)).await;
        self.retire(persistent, &slot, &mut state);
        result
    }

    /// Delete a note's envelope, ending any live session first.
    ///
    /// Edits pending in a live staging copy are discarded along with the
    /// note; the copy and its watch handles are cleaned up before the
    /// envelope is removed.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::NoteNotFound` if no envelope exists, or
    /// `NoteError::AlreadyOpen` if another manager has the note staged.
    pub async fn delete(&self, persistent: &Path) -> Result<()> {
        self.layout.ensure_encrypted(persistent)?;

        let (slot, mut state) = self.acquire_or_create(persistent).await;
        if let Some(session) = state.session.take() {
            if let Err(err) = self.teardown(session, None).await {
                log::warn!(
                    "Ending session for {} before delete: {}",
                    persistent.display(),
                    err
                );
            }
        }

        let fs = Arc::clone(&self.fs);
        let staging_root = self.staging_root.clone();
        let target = persistent.to_path_buf();
        let result = task::spawn_blocking(move || {
            if !fs.exists(&target) {
                return Err(NoteError::NoteNotFound(target));
            }
            let claim = claim::claim_path(&staging_root, &target);
            if fs.exists(&claim) {
                return Err(NoteError::AlreadyOpen {
                    path: target,
                    claim,
                });
            }
            fs.remove(&target)
                .map_err(|e| NoteError::io("remove", &target, e))
        })
        .await
        .map_err(NoteError::from)
        .and_then(|inner| inner);

        self.retire(persistent, &slot, &mut state);
        if result.is_ok() {
            log::info!("Deleted {}", persistent.display());
        }
        result
    }

    /// Tie a watch handle to a live session.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::SessionNotFound` if the note is not staged; the
    /// handle is released immediately in that case.
    pub async fn watch(&self, persistent: &Path, handle: WatchHandle) -> Result<()> {
        let Some((_slot, mut state)) = self.acquire_existing(persistent).await else {
            return Err(NoteError::SessionNotFound(persistent.to_path_buf()));
        };
        match state.session.as_mut() {
            Some(session) => {
                log::debug!(
                    "watching {} ('{}')",
                    persistent.display(),
                    handle.label()
                );
                session.watch_handles.push(handle);
                Ok(())
            }
            None => Err(NoteError::SessionNotFound(persistent.to_path_buf())),
        }
    }

    /// Whether the note currently has a live session.
    pub async fn is_staged(&self, persistent: &Path) -> bool {
        self.session_info(persistent).await.is_some()
    }

    /// Whether any manager sharing the staging root has the note staged.
    pub async fn is_claimed(&self, persistent: &Path) -> bool {
        let fs = Arc::clone(&self.fs);
        let staging_root = self.staging_root.clone();
        let persistent = persistent.to_path_buf();
        task::spawn_blocking(move || fs.exists(&claim::claim_path(&staging_root, &persistent)))
            .await
            .unwrap_or(false)
    }

    /// Snapshot of the note's live session, if any.
    pub async fn session_info(&self, persistent: &Path) -> Option<SessionInfo> {
        let (_slot, state) = self.acquire_existing(persistent).await?;
        state.session.as_ref().map(StagingSession::info)
    }

    /// Snapshots of every live session, ordered by persistent path.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let slots: Vec<Slot> = self.registry().values().cloned().collect();
        let mut infos = Vec::with_capacity(slots.len());
        for slot in slots {
            let state = slot.lock().await;
            if let Some(session) = state.session.as_ref() {
                infos.push(session.info());
            }
        }
        infos.sort_by(|a, b| a.persistent_path.cmp(&b.persistent_path));
        infos
    }

    /// Close every live session, returning the failures.
    pub async fn close_all(&self, password: &str) -> Vec<(PathBuf, NoteError)> {
        let paths: Vec<PathBuf> = self.registry().keys().cloned().collect();
        let mut failures = Vec::new();
        for path in paths {
            match self.close(&path, password).await {
                Ok(()) | Err(NoteError::SessionNotFound(_)) => {}
                Err(err) => failures.push((path, err)),
            }
        }
        failures
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<PathBuf, Slot>> {
        // Map operations never panic midway, so a poisoned map is still consistent.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn acquire_or_create(&self, persistent: &Path) -> (Slot, SlotGuard) {
        loop {
            let slot = Arc::clone(
                self.registry()
                    .entry(persistent.to_path_buf())
                    .or_default(),
            );
            let guard = Arc::clone(&slot).lock_owned().await;
            if !guard.retired {
                return (slot, guard);
            }
        }
    }

    async fn acquire_existing(&self, persistent: &Path) -> Option<(Slot, SlotGuard)> {
        loop {
            let slot = self.registry().get(persistent).cloned()?;
            let guard = Arc::clone(&slot).lock_owned().await;
            if !guard.retired {
                return Some((slot, guard));
            }
        }
    }

    /// Mark an emptied slot dead and drop it from the registry.
    ///
    /// Must be called while holding the slot's lock.
    fn retire(&self, persistent: &Path, slot: &Slot, state: &mut SlotState) {
        state.retired = true;
        let mut registry = self.registry();
        if registry
            .get(persistent)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            registry.remove(persistent);
        }
    }

    async fn install(&self, state: &mut SlotState, session: StagingSession) -> Result<()> {
        if state.session.is_some() {
            let persistent = session.persistent_path.clone();
            log::error!(
                "refusing to track a second staging session for {}",
                persistent.display()
            );
            if let Err(err) = self
                .remove_staging(&session.staging_path, &session.staging_dir)
                .await
            {
                log::warn!("Discarding duplicate staging copy: {}", err);
            }
            return Err(NoteError::SessionConflict(persistent));
        }
        state.session = Some(session);
        Ok(())
    }

    async fn stage(&self, persistent: &Path, password: &str) -> Result<StagingSession> {
        let staging_dir = self
            .staging_root
            .join(Uuid::new_v4().simple().to_string());
        let staging_path = staging_dir.join(self.layout.staging_file_name(persistent)?);

        let fs = Arc::clone(&self.fs);
        let codec = self.codec;
        let password = Zeroizing::new(password.to_string());
        let staging_root = self.staging_root.clone();
        let source = persistent.to_path_buf();
        let target = staging_path.clone();
        let dir = staging_dir.clone();
        let claim_path = task::spawn_blocking(move || {
            if !fs.exists(&source) {
                return Err(NoteError::NoteNotFound(source));
            }
            let claim = claim::claim_path(&staging_root, &source);
            claim::acquire(fs.as_ref(), &claim, &source)?;

            let staged = (|| -> Result<()> {
                let bytes = fs
                    .read(&source)
                    .map_err(|e| NoteError::io("read", &source, e))?;
                let plaintext = codec.decrypt_bytes(&bytes, &password)?;
                if let Err(err) = fs.write_atomic(&target, &plaintext) {
                    let _ = fs.remove_dir_all(&dir);
                    return Err(NoteError::io("write", &target, err));
                }
                Ok(())
            })();
            match staged {
                Ok(()) => Ok(claim),
                Err(err) => {
                    if let Err(release_err) = claim::release(fs.as_ref(), &claim) {
                        log::warn!("Releasing claim after failed open: {}", release_err);
                    }
                    Err(err)
                }
            }
        })
        .await??;

        Ok(StagingSession::new(
            persistent.to_path_buf(),
            staging_dir,
            staging_path,
            claim_path,
        ))
    }

    async fn seal_staging(&self, session: &mut StagingSession, password: &str) -> Result<()> {
        self.layout.ensure_encrypted(&session.persistent_path)?;

        let fs = Arc::clone(&self.fs);
        let codec = self.codec;
        let password = Zeroizing::new(password.to_string());
        let source = session.staging_path.clone();
        let target = session.persistent_path.clone();
        task::spawn_blocking(move || {
            let plaintext = Zeroizing::new(
                fs.read(&source)
                    .map_err(|e| NoteError::io("read", &source, e))?,
            );
            let envelope = codec.encrypt(&plaintext, &password)?;
            fs.write_atomic(&target, &envelope.to_bytes())
                .map_err(|e| NoteError::io("write", &target, e))
        })
        .await??;

        session.last_persisted_at = Some(Utc::now());
        log::info!("Sealed {}", session.persistent_path.display());
        Ok(())
    }

    /// End a session, then give up its claim whatever the outcome.
    async fn teardown(&self, mut session: StagingSession, password: Option<&str>) -> Result<()> {
        let ended = self.end_session(&mut session, password).await;

        let fs = Arc::clone(&self.fs);
        let claim = session.claim_path.clone();
        let released = task::spawn_blocking(move || claim::release(fs.as_ref(), &claim))
            .await
            .map_err(NoteError::from)
            .and_then(|inner| inner);
        match (ended, released) {
            (Err(err), _) => Err(err),
            (Ok(()), Err(err)) => {
                log::warn!(
                    "{} is closed but its claim could not be released: {}",
                    session.persistent_path.display(),
                    err
                );
                Err(err)
            }
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Optional final persist, release watches, delete the copy.
    async fn end_session(&self, session: &mut StagingSession, password: Option<&str>) -> Result<()> {
        let persisted = match password {
            Some(password) => self.seal_staging(session, password).await,
            None => Ok(()),
        };

        let released = session.release_watches();
        log::debug!(
            "released {} watch handle(s) for {}",
            released,
            session.persistent_path.display()
        );

        if let Err(err) = persisted {
            log::error!(
                "Final save of {} failed; staging copy kept at {}: {}",
                session.persistent_path.display(),
                session.staging_path.display(),
                err
            );
            return Err(err);
        }

        match self
            .remove_staging(&session.staging_path, &session.staging_dir)
            .await
        {
            Ok(()) => {
                log::info!("Closed {}", session.persistent_path.display());
                Ok(())
            }
            Err(err) => {
                log::warn!(
                    "{} is sealed but its staging copy could not be removed: {}",
                    session.persistent_path.display(),
                    err
                );
                Err(err)
            }
        }
    }

    async fn remove_staging(&self, file: &Path, dir: &Path) -> Result<()> {
        let fs = Arc::clone(&self.fs);
        let file = file.to_path_buf();
        let dir = dir.to_path_buf();
        task::spawn_blocking(move || {
            if fs.exists(&file) {
                fs.remove(&file)
                    .map_err(|e| NoteError::io("remove", &file, e))?;
            }
            fs.remove_dir_all(&dir)
                .map_err(|e| NoteError::io("remove", &dir, e))
        })
        .await?
    }
}
