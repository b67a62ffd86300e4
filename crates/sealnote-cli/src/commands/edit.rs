//! Editor sessions.
//!
//! A note is staged, the editor runs on the staging copy, and every save
//! the watcher reports is sealed back into the encrypted note. Closing the
//! session seals once more and removes the plaintext.

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use sealnote_core::{NoteStore, Staged};

use crate::app::{unlock, AppContext, PasswordPrompt};
use crate::cli::EditArgs;
use crate::constants::SAVE_DEBOUNCE;
use crate::helpers::{ensure_note_exists, record_change};
use crate::ui::{badge, print, Badge, Spinner};
use crate::watch::watch_staging;

pub async fn handle_edit(ctx: &AppContext<'_>, args: &EditArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(false, None);
    let store = ctx.store()?;
    let path = store.resolve(&args.name)?;
    ensure_note_exists(&args.name, &path)?;
    let editor = ctx.editor()?;

    let mut prompt = PasswordPrompt::new(ctx.interactive());
    let (store_ref, ui_ref) = (&store, &ui);
    let (password, staged) = unlock(&mut prompt, |password: SecretString| {
        let name = args.name.clone();
        async move {
            let _spinner = Spinner::start(ui_ref, "Decrypting");
            let result = store_ref.open(&name, password.expose_secret()).await;
            (password, result)
        }
    })
    .await?;

    let changed = edit_session(&store, &args.name, &password, &staged, &editor).await?;

    if changed && ctx.config().vcs.commit_on_close {
        record_change(ctx, "Edit", &args.name, path).await;
    }
    if !ctx.quiet() {
        let message = if changed {
            badge(&ui, Badge::Ok, &format!("Saved {}", args.name))
        } else {
            badge(&ui, Badge::Info, &format!("No changes to {}", args.name))
        };
        print(&ui, &message);
    }
    Ok(())
}

/// Run `editor` on an open note and close the session afterwards.
///
/// Returns whether the plaintext changed. The session is closed even when
/// the editor could not be started.
pub async fn edit_session(
    store: &NoteStore,
    name: &str,
    password: &SecretString,
    staged: &Staged,
    editor: &[String],
) -> anyhow::Result<bool> {
    let before = std::fs::read(&staged.staging_path).map(Zeroizing::new);
    let supervised = supervise(store, name, password, staged, editor).await;
    let after = std::fs::read(&staged.staging_path).map(Zeroizing::new);

    if let Err(e) = store.close(name, password.expose_secret()).await {
        return Err(anyhow::anyhow!(
            "Failed to close {}: {}\nHint: Check {} for the plaintext copy.",
            name,
            e,
            staged.staging_path.display()
        ));
    }
    supervised?;

    Ok(match (before, after) {
        (Ok(before), Ok(after)) => *before != *after,
        _ => true,
    })
}

async fn supervise(
    store: &NoteStore,
    name: &str,
    password: &SecretString,
    staged: &Staged,
    editor: &[String],
) -> anyhow::Result<()> {
    let (program, editor_args) = editor
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Editor command is empty"))?;

    let (handle, mut saves) = watch_staging(&staged.staging_path)?;
    store.watch(name, handle).await?;

    let mut child = tokio::process::Command::new(program)
        .args(editor_args)
        .arg(&staged.staging_path)
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to launch editor `{}`: {}", program, e))?;
    log::debug!("Editing {} with {}", name, program);

    loop {
        tokio::select! {
            status = child.wait() => {
                let status = status
                    .map_err(|e| anyhow::anyhow!("Failed to wait for editor: {}", e))?;
                if !status.success() {
                    log::warn!("Editor exited with {}", status);
                }
                return Ok(());
            }
            Some(()) = saves.recv() => {
                tokio::time::sleep(SAVE_DEBOUNCE).await;
                while saves.try_recv().is_ok() {}
                match store.persist(name, password.expose_secret()).await {
                    Ok(()) => log::info!("Sealed save of {}", name),
                    Err(e) => log::warn!("Failed to seal save of {}: {}", name, e),
                }
            }
            Ok(()) = tokio::signal::ctrl_c() => {
                log::warn!("Interrupted; closing {}", name);
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to stop editor: {}", e);
                }
                return Ok(());
            }
        }
    }
}
