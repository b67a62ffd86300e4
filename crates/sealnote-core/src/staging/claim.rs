//! Claims on notes that hold across processes.
//!
//! The slot registry only orders sessions inside one manager. Every manager
//! pointed at the same staging root also agrees on a claim file per note,
//! created exclusively when the note is staged and removed when its session
//! ends. A claim left behind by a crashed process blocks the note until it
//! is removed by hand.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{NoteError, Result};
use crate::fs::Filesystem;

const CLAIM_EXTENSION: &str = "claim";

/// Written into the claim file so a stale claim can be traced by hand.
#[derive(Debug, Serialize)]
struct ClaimRecord<'a> {
    note: &'a Path,
    pid: u32,
    claimed_at: DateTime<Utc>,
}

/// Claim file for `persistent` under `staging_root`.
///
/// Named from the canonical note path, so two processes reaching one note
/// through different spellings of its path still collide.
pub(crate) fn claim_path(staging_root: &Path, persistent: &Path) -> PathBuf {
    let canonical =
        std::fs::canonicalize(persistent).unwrap_or_else(|_| persistent.to_path_buf());
    let id = Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        canonical.to_string_lossy().as_bytes(),
    );
    staging_root.join(format!("{}.{}", id.simple(), CLAIM_EXTENSION))
}

/// Whether `path` names a claim file rather than a session directory.
pub fn is_claim_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CLAIM_EXTENSION)
}

/// Take the claim, failing with `AlreadyOpen` if another session holds it.
pub(crate) fn acquire(fs: &dyn Filesystem, claim: &Path, persistent: &Path) -> Result<()> {
    let record = ClaimRecord {
        note: persistent,
        pid: std::process::id(),
        claimed_at: Utc::now(),
    };
    let contents = serde_json::to_vec(&record).unwrap_or_default();
    match fs.create_new(claim, &contents) {
        Ok(()) => {
            log::debug!("claimed {} ({})", persistent.display(), claim.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(NoteError::AlreadyOpen {
            path: persistent.to_path_buf(),
            claim: claim.to_path_buf(),
        }),
        Err(err) => Err(NoteError::io("claim", claim, err)),
    }
}

/// Give the claim up. A claim that is already gone is not an error.
pub(crate) fn release(fs: &dyn Filesystem, claim: &Path) -> Result<()> {
    match fs.remove(claim) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(NoteError::io("remove", claim, err)),
    }
}
