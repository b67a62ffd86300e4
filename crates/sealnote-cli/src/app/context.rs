//! Per-invocation application context.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sealnote_core::staging::is_claim_file;
use sealnote_core::{NoteStore, VersionControl};

use crate::cli::Cli;
use crate::config::SealnoteConfig;
use crate::git::GitCli;
use crate::ui::{ListFormat, UiContext};

use super::resolver::load_config;

/// CLI arguments bundled with the effective configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: SealnoteConfig,
}

impl<'a> AppContext<'a> {
    pub fn load(cli: &'a Cli) -> anyhow::Result<Self> {
        Ok(Self {
            cli,
            config: load_config(cli)?,
        })
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn config(&self) -> &SealnoteConfig {
        &self.config
    }

    pub fn root(&self) -> PathBuf {
        self.config.root()
    }

    pub fn ui(&self, json: bool, format: Option<ListFormat>) -> UiContext {
        UiContext::from_env(json, format, self.cli.no_color, self.cli.ascii)
    }

    /// Whether password prompts and confirmations can be shown.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    /// Open the note store for the configured collection.
    pub fn store(&self) -> anyhow::Result<NoteStore> {
        let root = self.root();
        if !root.is_dir() {
            return Err(crate::errors::CliError::not_found(
                format!("Collection not found at {}", root.display()),
                "Hint: Run `sealnote init` to create it.",
            )
            .into());
        }
        let staging_dir = self.config.staging_dir();
        prepare_staging_dir(&staging_dir)?;
        warn_leftover_staging(&staging_dir);
        Ok(NoteStore::local(root, self.config.layout()?, staging_dir))
    }

    /// Version control for the collection, if enabled.
    pub fn vcs(&self) -> Option<Arc<dyn VersionControl>> {
        if !self.config.vcs.enabled {
            return None;
        }
        Some(Arc::new(GitCli::new(
            self.config.collection.encrypted_extension.trim_start_matches('.'),
        )))
    }

    /// Editor command line: config, then `$VISUAL`, then `$EDITOR`.
    pub fn editor(&self) -> anyhow::Result<Vec<String>> {
        let command = self
            .config
            .editor
            .command
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("No editor configured; set [editor] command in the config or $EDITOR")
            })?;
        Ok(command.split_whitespace().map(str::to_string).collect())
    }
}

/// Create the staging root readable by the owner only.
fn prepare_staging_dir(path: &Path) -> anyhow::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|e| {
        anyhow::anyhow!("Failed to create staging directory {}: {}", path.display(), e)
    })
}

/// Staging copies that outlived their session hold plaintext the user may
/// still need; point them out instead of deleting them.
fn warn_leftover_staging(path: &Path) {
    let Ok(entries) = std::fs::read_dir(path) else {
        return;
    };
    let leftovers = entries
        .filter_map(Result::ok)
        .filter(|entry| !is_claim_file(&entry.path()))
        .count();
    if leftovers > 0 {
        log::warn!(
            "{} staging director{} found in {}; unless another edit is running, review and delete them",
            leftovers,
            if leftovers == 1 { "y" } else { "ies" },
            path.display()
        );
    }
}
