//! Staging session records and the watch handles they own.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An observation registration tied to one staging session.
///
/// The release action runs exactly once, when the handle is dropped. A
/// session owns its handles, so every teardown path (close, delete, a failed
/// attach) releases them.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use sealnote_core::WatchHandle;
///
/// let released = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&released);
/// let handle = WatchHandle::new("editor-save", move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// drop(handle);
/// assert_eq!(released.load(Ordering::SeqCst), 1);
/// ```
pub struct WatchHandle {
    label: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    /// Register a release action.
    pub fn new(label: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label: label.into(),
            release: Some(Box::new(release)),
        }
    }

    /// Keep `guard` alive for the session's lifetime and drop it on release.
    ///
    /// Suited to watcher types that stop watching when dropped.
    pub fn guard<T: Send + 'static>(label: impl Into<String>, guard: T) -> Self {
        Self::new(label, move || drop(guard))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            log::debug!("releasing watch handle '{}'", self.label);
            release();
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("label", &self.label)
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Live association between an encrypted note and its plaintext copy.
#[derive(Debug)]
pub(crate) struct StagingSession {
    pub(crate) persistent_path: PathBuf,
    /// Per-session directory holding the staging copy and any editor droppings.
    pub(crate) staging_dir: PathBuf,
    pub(crate) staging_path: PathBuf,
    /// Claim file shared with other managers on the same staging root.
    pub(crate) claim_path: PathBuf,
    pub(crate) watch_handles: Vec<WatchHandle>,
    pub(crate) opened_at: DateTime<Utc>,
    pub(crate) last_persisted_at: Option<DateTime<Utc>>,
}

impl StagingSession {
    pub(crate) fn new(
        persistent_path: PathBuf,
        staging_dir: PathBuf,
        staging_path: PathBuf,
        claim_path: PathBuf,
    ) -> Self {
        Self {
            persistent_path,
            staging_dir,
            staging_path,
            claim_path,
            watch_handles: Vec::new(),
            opened_at: Utc::now(),
            last_persisted_at: None,
        }
    }

    /// Drop every watch handle; returns how many were released.
    pub(crate) fn release_watches(&mut self) -> usize {
        let count = self.watch_handles.len();
        self.watch_handles.clear();
        count
    }

    pub(crate) fn info(&self) -> SessionInfo {
        SessionInfo {
            persistent_path: self.persistent_path.clone(),
            staging_path: self.staging_path.clone(),
            opened_at: self.opened_at,
            last_persisted_at: self.last_persisted_at,
            watch_count: self.watch_handles.len(),
        }
    }
}

/// Snapshot of a live session, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub persistent_path: PathBuf,
    pub staging_path: PathBuf,
    pub opened_at: DateTime<Utc>,
    pub last_persisted_at: Option<DateTime<Utc>>,
    pub watch_count: usize,
}

/// Result of opening a note for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    /// Where the plaintext working copy lives.
    pub staging_path: PathBuf,
    /// True when the note was already open and the existing copy was returned.
    pub reused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_handle(label: &str, counter: &Arc<AtomicUsize>) -> WatchHandle {
        let counter = Arc::clone(counter);
        WatchHandle::new(label, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_release_watches_drops_each_handle_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut session = StagingSession::new(
            PathBuf::from("/notes/a.enc"),
            PathBuf::from("/staging/x"),
            PathBuf::from("/staging/x/a.md"),
            PathBuf::from("/staging/x.claim"),
        );
        session.watch_handles.push(counting_handle("save", &released));
        session.watch_handles.push(counting_handle("close", &released));

        assert_eq!(session.info().watch_count, 2);
        assert_eq!(session.release_watches(), 2);
        assert_eq!(released.load(Ordering::SeqCst), 2);

        assert_eq!(session.release_watches(), 0);
        drop(session);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_guard_handle_drops_guard() {
        struct Flag(Arc<AtomicUsize>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));
        let handle = WatchHandle::guard("watcher", Flag(Arc::clone(&dropped)));
        assert_eq!(handle.label(), "watcher");
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        drop(handle);
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }
}
