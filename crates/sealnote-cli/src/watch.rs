//! Save detection for staging copies.
//!
//! A notify watcher on the session's staging directory forwards change
//! events into a tokio channel. The watcher is wrapped in a `WatchHandle`
//! so the staging session owns it and stops it on teardown.

use std::path::Path;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use sealnote_core::WatchHandle;

/// Watch the directory holding `staging_path`.
///
/// Returns the handle to attach to the session and a receiver that yields
/// one message per create/modify event touching the staging copy.
pub fn watch_staging(staging_path: &Path) -> anyhow::Result<(WatchHandle, mpsc::UnboundedReceiver<()>)> {
    let dir = staging_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Staging path {} has no parent", staging_path.display()))?
        .to_path_buf();
    let target = staging_path.to_path_buf();
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if touches(&event, &target) => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => log::warn!("Watch error: {}", e),
        },
        Config::default(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create file watcher: {}", e))?;

    // Editors that save via rename replace the file, so watch the directory.
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| anyhow::anyhow!("Failed to watch {}: {}", dir.display(), e))?;

    Ok((WatchHandle::guard(label_for(&dir), watcher), rx))
}

fn touches(event: &Event, target: &Path) -> bool {
    (event.kind.is_create() || event.kind.is_modify())
        && event.paths.iter().any(|p| p.as_path() == target)
}

fn label_for(dir: &Path) -> String {
    format!("notify:{}", dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind};

    #[test]
    fn test_touches_only_matching_writes() {
        let target = PathBuf::from("/staging/x/todo.md");
        let modify = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(target.clone());
        let create = Event::new(EventKind::Create(CreateKind::File)).add_path(target.clone());
        let swap = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/staging/x/.todo.md.swp"));
        let remove = Event::new(EventKind::Remove(RemoveKind::File)).add_path(target.clone());

        assert!(touches(&modify, &target));
        assert!(touches(&create, &target));
        assert!(!touches(&swap, &target));
        assert!(!touches(&remove, &target));
    }

    #[tokio::test]
    async fn test_write_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("todo.md");
        std::fs::write(&target, "v1").unwrap();

        let (handle, mut rx) = watch_staging(&target).unwrap();
        assert!(handle.label().starts_with("notify:"));
        std::fs::write(&target, "v2").unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(event, Ok(Some(()))));

        drop(handle);
    }
}
