//! Path resolution for the config file and the collection.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, SealnoteConfig};
use crate::errors::CliError;

/// Resolve the config file path, checking SEALNOTE_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("SEALNOTE_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load the effective configuration.
///
/// `--root`/`SEALNOTE_ROOT` overrides the configured root and makes the
/// config file optional.
pub fn load_config(cli: &Cli) -> anyhow::Result<SealnoteConfig> {
    let config_path = resolve_config_path()?;
    let config = if config_path.exists() {
        Some(read_config(&config_path)?)
    } else {
        None
    };

    match (cli.root.as_deref(), config) {
        (Some(root), Some(mut config)) => {
            config.collection.root = root.to_string();
            Ok(config)
        }
        (Some(root), None) => Ok(SealnoteConfig::new(PathBuf::from(root), false)),
        (None, Some(config)) => Ok(config),
        (None, None) => Err(CliError::not_found(
            missing_collection_message(&config_path),
            "Hint: Run `sealnote init` or pass --root.",
        )
        .into()),
    }
}

fn missing_collection_message(config_path: &Path) -> String {
    format!("No collection configured (no config at {})", config_path.display())
}
