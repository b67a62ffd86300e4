use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sealnote_core::{NoteError, NoteLayout, NoteStore, WatchHandle};
use tempfile::TempDir;

const PASSWORD: &str = "test-passphrase-secure-123";

struct Collection {
    dir: TempDir,
    store: Arc<NoteStore>,
}

impl Collection {
    fn new() -> Self {
        Self::with_layout(NoteLayout::default())
    }

    fn with_layout(layout: NoteLayout) -> Self {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = NoteStore::local(dir.path().join("notes"), layout, dir.path().join("staging"));
        Self {
            dir,
            store: Arc::new(store),
        }
    }

    /// A second store over the same notes and staging root, as another process would open it.
    fn second_store(&self) -> NoteStore {
        NoteStore::local(
            self.dir.path().join("notes"),
            NoteLayout::default(),
            self.staging_root(),
        )
    }

    fn staging_root(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    fn staged_files(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let Ok(dirs) = std::fs::read_dir(self.staging_root()) else {
            return found;
        };
        for dir in dirs {
            let dir = dir.expect("entry should be readable").path();
            if sealnote_core::staging::is_claim_file(&dir) {
                continue;
            }
            for file in std::fs::read_dir(&dir).expect("staging dir should be readable") {
                found.push(file.expect("entry should be readable").path());
            }
        }
        found
    }
}

fn read_to_string(path: &Path) -> String {
    std::fs::read_to_string(path).expect("file should be readable")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_produce_one_staging_copy() {
    let collection = Collection::new();
    collection
        .store
        .create("journal", b"day one", PASSWORD)
        .await
        .expect("create should succeed");

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&collection.store);
        tasks.push(tokio::spawn(async move { store.open("journal", PASSWORD).await }));
    }

    let mut staging_paths = Vec::new();
    for task in tasks {
        let staged = task
            .await
            .expect("task should not panic")
            .expect("open should succeed");
        staging_paths.push(staged.staging_path);
    }
    staging_paths.dedup();

    assert_eq!(staging_paths.len(), 1);
    assert_eq!(collection.staged_files(), staging_paths);
    assert_eq!(collection.store.sessions().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_open_close_cycles_never_leak_sessions() {
    let collection = Collection::new();
    collection
        .store
        .create("journal", b"entry", PASSWORD)
        .await
        .expect("create should succeed");

    let mut tasks = Vec::new();
    for i in 0..12 {
        let store = Arc::clone(&collection.store);
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store.open("journal", PASSWORD).await.map(|_| ())
            } else {
                match store.close("journal", PASSWORD).await {
                    Err(NoteError::SessionNotFound(_)) => Ok(()),
                    other => other,
                }
            }
        }));
    }
    for task in tasks {
        task.await
            .expect("task should not panic")
            .expect("operation should succeed");
    }

    let live = collection.store.sessions().await.len();
    assert!(live <= 1);
    assert_eq!(collection.staged_files().len(), live);

    collection.store.close_all(PASSWORD).await;
    assert!(collection.staged_files().is_empty());
    assert_eq!(
        collection.store.read("journal", PASSWORD).await.unwrap().as_slice(),
        b"entry"
    );
}

#[tokio::test]
async fn test_close_makes_edits_durable_and_removes_plaintext() {
    let collection = Collection::new();
    let path = collection
        .store
        .create("ideas", b"first draft", PASSWORD)
        .await
        .expect("create should succeed");

    let staged = collection.store.open("ideas", PASSWORD).await.unwrap();
    assert_eq!(read_to_string(&staged.staging_path), "first draft");
    std::fs::write(&staged.staging_path, "second draft").unwrap();

    collection.store.close("ideas", PASSWORD).await.unwrap();

    assert!(collection.staged_files().is_empty());
    let on_disk = read_to_string(&path);
    assert!(!on_disk.contains("second draft"));
    assert_eq!(
        collection.store.read("ideas", PASSWORD).await.unwrap().as_slice(),
        b"second draft"
    );
}

#[tokio::test]
async fn test_watch_handles_released_on_delete() {
    let collection = Collection::new();
    collection.store.create("scratch", b"x", PASSWORD).await.unwrap();
    collection.store.open("scratch", PASSWORD).await.unwrap();

    let released = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&released);
    collection
        .store
        .watch(
            "scratch",
            WatchHandle::new("save", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

    collection.store.delete("scratch").await.unwrap();

    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(collection.staged_files().is_empty());
    assert!(collection.store.list().await.unwrap().is_empty());
    assert!(matches!(
        collection.store.read("scratch", PASSWORD).await,
        Err(NoteError::NoteNotFound(_))
    ));
}

#[tokio::test]
async fn test_custom_layout_swaps_extensions() {
    let layout = NoteLayout::new("secret", "txt").unwrap();
    let collection = Collection::with_layout(layout);

    let path = collection.store.create("log", b"hi", PASSWORD).await.unwrap();
    assert_eq!(path.extension().unwrap(), "secret");

    let staged = collection.store.open("log.txt", PASSWORD).await.unwrap();
    assert_eq!(staged.staging_path.file_name().unwrap(), "log.txt");

    let manager = collection.store.staging();
    let err = manager
        .persist(&collection.dir.path().join("notes").join("log.txt"), PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, NoteError::InvalidInput(_) | NoteError::SessionNotFound(_)));

    let err = manager
        .open(&collection.dir.path().join("notes").join("log.txt"), PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, NoteError::InvalidInput(_)));

    collection.store.close("log", PASSWORD).await.unwrap();
}

#[tokio::test]
async fn test_wrong_password_leaves_note_sealed() {
    let collection = Collection::new();
    collection.store.create("diary", b"dear diary", PASSWORD).await.unwrap();

    let err = collection.store.open("diary", "not-the-password").await.unwrap_err();

    assert!(err.is_decryption());
    assert!(collection.staged_files().is_empty());
    let entries = collection.store.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].staged);
}

#[tokio::test]
async fn test_note_open_in_one_store_is_refused_by_another() {
    let collection = Collection::new();
    collection
        .store
        .create("journal", b"day one", PASSWORD)
        .await
        .expect("create should succeed");
    let other = collection.second_store();

    let staged = collection
        .store
        .open("journal", PASSWORD)
        .await
        .expect("open should succeed");
    std::fs::write(&staged.staging_path, b"day two").expect("edit should be written");

    let err = other
        .open("journal", PASSWORD)
        .await
        .expect_err("second store should be refused");
    assert!(matches!(err, NoteError::AlreadyOpen { .. }));
    assert!(err.to_string().contains("already open"));

    let listed = other.list().await.expect("list should succeed");
    assert!(listed[0].staged);

    collection
        .store
        .close("journal", PASSWORD)
        .await
        .expect("close should succeed");

    let reopened = other
        .open("journal", PASSWORD)
        .await
        .expect("open should succeed once the note is closed");
    assert_eq!(read_to_string(&reopened.staging_path), "day two");
    other
        .close("journal", PASSWORD)
        .await
        .expect("close should succeed");
    assert!(collection.staged_files().is_empty());
}
