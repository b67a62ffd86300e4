use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sealnote_core::staging::{DEFAULT_DISPLAY_EXTENSION, DEFAULT_ENCRYPTED_EXTENSION};
use sealnote_core::NoteLayout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealnoteConfig {
    pub collection: CollectionSection,
    #[serde(default)]
    pub staging: StagingSection,
    #[serde(default)]
    pub editor: EditorSection,
    #[serde(default)]
    pub vcs: VcsSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSection {
    pub root: String,
    #[serde(default = "default_encrypted_extension")]
    pub encrypted_extension: String,
    #[serde(default = "default_display_extension")]
    pub display_extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StagingSection {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EditorSection {
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsSection {
    pub enabled: bool,
    pub commit_on_close: bool,
    pub push_after_commit: bool,
}

impl Default for VcsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            commit_on_close: true,
            push_after_commit: false,
        }
    }
}

fn default_encrypted_extension() -> String {
    DEFAULT_ENCRYPTED_EXTENSION.to_string()
}

fn default_display_extension() -> String {
    DEFAULT_DISPLAY_EXTENSION.to_string()
}

impl SealnoteConfig {
    pub fn new(root: PathBuf, git: bool) -> Self {
        Self {
            collection: CollectionSection {
                root: root.to_string_lossy().to_string(),
                encrypted_extension: default_encrypted_extension(),
                display_extension: default_display_extension(),
            },
            staging: StagingSection::default(),
            editor: EditorSection::default(),
            vcs: VcsSection {
                enabled: git,
                ..VcsSection::default()
            },
        }
    }

    pub fn root(&self) -> PathBuf {
        expand_home(&self.collection.root)
    }

    pub fn layout(&self) -> anyhow::Result<NoteLayout> {
        NoteLayout::new(
            &self.collection.encrypted_extension,
            &self.collection.display_extension,
        )
        .map_err(|e| anyhow::anyhow!("Invalid [collection] extensions: {}", e))
    }

    /// Where plaintext staging copies are written.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging
            .dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
            .map(expand_home)
            .unwrap_or_else(default_staging_dir)
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_collection_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("notes"))
}

/// `$XDG_RUNTIME_DIR/sealnote` (usually tmpfs), else a directory under the system temp dir.
pub fn default_staging_dir() -> PathBuf {
    if let Ok(value) = std::env::var("XDG_RUNTIME_DIR") {
        if !value.trim().is_empty() {
            return PathBuf::from(value).join("sealnote");
        }
    }
    std::env::temp_dir().join("sealnote-staging")
}

pub fn read_config(path: &Path) -> anyhow::Result<SealnoteConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &SealnoteConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("sealnote"));
        }
    }
    Ok(home_dir()?.join(".config").join("sealnote"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("sealnote"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("sealnote"))
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => match home_dir() {
            Ok(home) => home.join(rest),
            Err(_) => PathBuf::from(value),
        },
        None if value == "~" => home_dir().unwrap_or_else(|_| PathBuf::from(value)),
        None => PathBuf::from(value),
    }
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
