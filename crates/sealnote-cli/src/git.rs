//! Git as the collection's version control, driven through the `git` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sealnote_core::vcs::ensure_sealed_paths;
use sealnote_core::{NoteError, VersionControl};

pub struct GitCli {
    encrypted_extension: String,
}

impl GitCli {
    pub fn new(encrypted_extension: impl Into<String>) -> Self {
        Self {
            encrypted_extension: encrypted_extension.into(),
        }
    }

    fn run(&self, root: &Path, args: &[&str], paths: &[PathBuf]) -> sealnote_core::Result<Output> {
        let mut command = Command::new("git");
        command.arg("-C").arg(root).args(args);
        if !paths.is_empty() {
            command.arg("--").args(paths);
        }
        log::debug!("running git {}", args.join(" "));
        command
            .output()
            .map_err(|e| NoteError::Vcs(format!("Failed to run git: {}", e)))
    }

    fn run_checked(&self, root: &Path, args: &[&str], paths: &[PathBuf]) -> sealnote_core::Result<()> {
        let output = self.run(root, args, paths)?;
        if output.status.success() {
            return Ok(());
        }
        Err(NoteError::Vcs(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

impl VersionControl for GitCli {
    fn init(&self, root: &Path) -> sealnote_core::Result<()> {
        if root.join(".git").exists() {
            return Ok(());
        }
        self.run_checked(root, &["init", "--quiet"], &[])
    }

    fn commit(&self, root: &Path, paths: &[PathBuf], message: &str) -> sealnote_core::Result<bool> {
        ensure_sealed_paths(paths, &self.encrypted_extension)?;
        // `add -A` also stages deletions of the given paths.
        self.run_checked(root, &["add", "-A"], paths)?;

        let diff = self.run(root, &["diff", "--cached", "--quiet"], paths)?;
        if diff.status.success() {
            return Ok(false);
        }

        self.run_checked(root, &["commit", "--quiet", "-m", message], paths)?;
        Ok(true)
    }

    fn push(&self, root: &Path) -> sealnote_core::Result<()> {
        self.run_checked(root, &["push", "--quiet"], &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn configure_identity(root: &Path) {
        for (key, value) in [("user.name", "Sealnote Test"), ("user.email", "test@example.com")] {
            let status = Command::new("git")
                .arg("-C")
                .arg(root)
                .args(["config", key, value])
                .status()
                .unwrap();
            assert!(status.success());
        }
    }

    #[test]
    fn test_refuses_plaintext_paths() {
        let git = GitCli::new("enc");
        let dir = tempfile::tempdir().unwrap();
        let err = git
            .commit(dir.path(), &[dir.path().join("leak.md")], "oops")
            .unwrap_err();
        assert!(matches!(err, NoteError::Vcs(_)));
    }

    #[test]
    fn test_init_commit_and_noop_commit() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let git = GitCli::new("enc");

        git.init(root).unwrap();
        git.init(root).unwrap();
        configure_identity(root);

        let note = root.join("todo.enc");
        std::fs::write(&note, "{}").unwrap();
        assert!(git.commit(root, &[note.clone()], "Create todo").unwrap());
        assert!(!git.commit(root, &[note.clone()], "Nothing").unwrap());

        std::fs::remove_file(&note).unwrap();
        assert!(git.commit(root, &[note], "Delete todo").unwrap());
    }

    #[test]
    fn test_push_without_remote_fails() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new("enc");
        git.init(dir.path()).unwrap();

        assert!(matches!(git.push(dir.path()), Err(NoteError::Vcs(_))));
    }
}
