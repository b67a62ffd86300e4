use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use dialoguer::Input;

use sealnote_core::VersionControl;

use crate::app::resolve_config_path;
use crate::cli::{Cli, InitArgs};
use crate::config::{default_collection_path, expand_home, write_config, SealnoteConfig};
use crate::errors::CliError;
use crate::git::GitCli;
use crate::ui::{badge, hint, kv, print, Badge, UiContext};

pub async fn handle_init(cli: &Cli, args: &InitArgs) -> anyhow::Result<()> {
    let ui = UiContext::from_env(false, None, cli.no_color, cli.ascii);
    let config_path = resolve_config_path()?;
    if config_path.exists() {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}. Edit it or remove it to re-initialize.",
            config_path.display()
        ))
        .into());
    }

    let root = match args.path.as_deref().or(cli.root.as_deref()) {
        Some(path) => expand_home(path),
        None if !args.no_input && std::io::stdin().is_terminal() => prompt_root()?,
        None => default_collection_path()?,
    };
    let root = absolute(&root)?;
    std::fs::create_dir_all(&root)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", root.display(), e))?;

    let config = SealnoteConfig::new(root.clone(), args.git);
    let layout = config.layout()?;

    if args.git {
        let git = GitCli::new(layout.encrypted_extension());
        let repo_root = root.clone();
        tokio::task::spawn_blocking(move || git.init(&repo_root)).await??;
        write_gitignore(&root, layout.display_extension())?;
    }

    write_config(&config_path, &config)?;
    log::info!("Initialized collection at {}", root.display());

    if !cli.quiet {
        print(
            &ui,
            &badge(&ui, Badge::Ok, &format!("Collection ready at {}", root.display())),
        );
        print(&ui, &kv(&ui, "Config", &config_path.display().to_string()));
        print(&ui, &hint(&ui, "Run `sealnote new <name>` to write your first note."));
    }
    Ok(())
}

fn prompt_root() -> anyhow::Result<PathBuf> {
    let default = default_collection_path()?;
    let answer: String = Input::new()
        .with_prompt("Collection directory")
        .default(default.display().to_string())
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to read collection directory: {}", e))?;
    Ok(expand_home(answer.trim()))
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| anyhow::anyhow!("Failed to read current directory: {}", e))?;
    Ok(cwd.join(path))
}

/// Keep plaintext copies out of the repository even if one lands in the root.
fn write_gitignore(root: &Path, display_extension: &str) -> anyhow::Result<()> {
    let path = root.join(".gitignore");
    let rule = format!("*.{}", display_extension);
    let existing = std::fs::read_to_string(&path).unwrap_or_default();
    if existing.lines().any(|line| line.trim() == rule) {
        return Ok(());
    }
    let mut contents = existing;
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&rule);
    contents.push('\n');
    std::fs::write(&path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitignore_rule_added_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "target").unwrap();

        write_gitignore(dir.path(), "md").unwrap();
        write_gitignore(dir.path(), "md").unwrap();

        let contents = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(contents, "target\n*.md\n");
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        assert_eq!(absolute(Path::new("/notes")).unwrap(), PathBuf::from("/notes"));
        assert!(absolute(Path::new("notes")).unwrap().is_absolute());
    }
}
