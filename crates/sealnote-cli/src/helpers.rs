//! Input and version-control helpers shared by the note commands.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use sealnote_core::vcs::commit_message;

use crate::app::AppContext;
use crate::errors::CliError;

/// Initial note content from `--body` or piped stdin.
///
/// Returns `None` when stdin is a terminal and no body was given, leaving
/// the content to the editor.
pub fn read_body(body: Option<String>) -> anyhow::Result<Option<String>> {
    if let Some(value) = body {
        return Ok(Some(value));
    }
    if io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(Some(buffer))
}

/// Reject missing notes with a pointer to `sealnote list`.
pub fn ensure_note_exists(name: &str, path: &std::path::Path) -> anyhow::Result<()> {
    if path.exists() {
        return Ok(());
    }
    Err(CliError::not_found(
        format!("Note not found: {}", name),
        "Hint: Run `sealnote list` to see available notes.",
    )
    .into())
}

/// Record a sealed change when version control is enabled.
///
/// The note is already durable at this point, so failures are reported as
/// warnings.
pub async fn record_change(ctx: &AppContext<'_>, action: &str, name: &str, path: PathBuf) {
    let Some(vcs) = ctx.vcs() else {
        return;
    };
    let root = ctx.root();
    let push = ctx.config().vcs.push_after_commit;
    let message = commit_message(action, name);

    let outcome = tokio::task::spawn_blocking(move || -> sealnote_core::Result<bool> {
        let committed = vcs.commit(&root, &[path], &message)?;
        if committed && push {
            vcs.push(&root)?;
        }
        Ok(committed)
    })
    .await;

    match outcome {
        Ok(Ok(true)) => log::info!("Committed {} {}", action, name),
        Ok(Ok(false)) => log::debug!("Nothing to commit for {}", name),
        Ok(Err(e)) => log::warn!("Version control: {}", e),
        Err(e) => log::warn!("Version control task failed: {}", e),
    }
}
