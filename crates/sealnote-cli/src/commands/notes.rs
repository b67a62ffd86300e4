use std::io::Write;

use dialoguer::Confirm;
use secrecy::{ExposeSecret, SecretString};

use sealnote_core::{NoteEntry, NoteStore};

use crate::app::{prompt_new_password, unlock, AppContext, PasswordPrompt};
use crate::cli::{ListArgs, NewArgs, RmArgs, ShowArgs};
use crate::errors::CliError;
use crate::helpers::{ensure_note_exists, read_body, record_change};
use crate::ui::render::header;
use crate::ui::{
    badge, format_bytes, format_datetime, hint, print, simple_table, Badge, Column, Spinner,
    UiContext,
};

use super::edit::edit_session;

pub async fn handle_list(ctx: &AppContext<'_>, args: &ListArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(args.json, args.format);
    let store = ctx.store()?;
    let entries = store.list().await?;

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        if !ctx.quiet() {
            print(&ui, "No notes yet.");
            print(&ui, &hint(&ui, "Run `sealnote new <name>` to create one."));
        }
        return Ok(());
    }

    if ui.mode.is_pretty() && !ctx.quiet() {
        let root = store.root().display().to_string();
        print(&ui, &header(&ui, "list", Some(&root)));
        println!();
    }
    let columns = [
        Column::new("NAME"),
        Column::new("SIZE"),
        Column::new("MODIFIED"),
        Column::new("STATE"),
    ];
    let rows: Vec<Vec<String>> = entries.iter().map(|e| entry_row(&ui, e)).collect();
    println!("{}", simple_table(&ui, &columns, &rows));
    Ok(())
}

fn entry_row(ui: &UiContext, entry: &NoteEntry) -> Vec<String> {
    let pretty = ui.mode.is_pretty();
    vec![
        entry.name.clone(),
        if pretty {
            format_bytes(entry.size)
        } else {
            entry.size.to_string()
        },
        entry
            .modified
            .as_ref()
            .map(|dt| format_datetime(dt, pretty))
            .unwrap_or_else(|| "-".to_string()),
        if entry.staged { "staged" } else { "sealed" }.to_string(),
    ]
}

/// The collection password: checked against an existing note, or chosen
/// fresh for an empty collection.
async fn collection_password(
    ctx: &AppContext<'_>,
    ui: &UiContext,
    store: &NoteStore,
) -> anyhow::Result<SecretString> {
    let entries = store.list().await?;
    let Some(sample) = entries.first() else {
        return prompt_new_password(ctx.interactive());
    };

    let mut prompt = PasswordPrompt::new(ctx.interactive());
    let (password, ()) = unlock(&mut prompt, |password: SecretString| {
        let name = sample.name.clone();
        async move {
            let _spinner = Spinner::start(ui, "Checking password");
            let result = store.read(&name, password.expose_secret()).await.map(drop);
            (password, result)
        }
    })
    .await?;
    Ok(password)
}

pub async fn handle_new(ctx: &AppContext<'_>, args: &NewArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(false, None);
    let store = ctx.store()?;
    let path = store.resolve(&args.name)?;
    if path.exists() {
        return Err(CliError::invalid_input(format!(
            "Note already exists: {}\nHint: Run `sealnote edit {}` to change it.",
            args.name, args.name
        ))
        .into());
    }

    let body = read_body(args.body.clone())?;
    let editor = match (&body, args.no_edit) {
        (None, false) => Some(ctx.editor()?),
        _ => None,
    };

    let password = collection_password(ctx, &ui, &store).await?;
    let initial = body.unwrap_or_default();
    {
        let _spinner = Spinner::start(&ui, "Encrypting");
        store
            .create(&args.name, initial.as_bytes(), password.expose_secret())
            .await?;
    }

    if let Some(editor) = editor {
        let staged = store.open(&args.name, password.expose_secret()).await?;
        edit_session(&store, &args.name, &password, &staged, &editor).await?;
    }

    record_change(ctx, "Create", &args.name, path).await;
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, &format!("Created {}", args.name)));
    }
    Ok(())
}

pub async fn handle_show(ctx: &AppContext<'_>, args: &ShowArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(false, None);
    let store = ctx.store()?;
    let path = store.resolve(&args.name)?;
    ensure_note_exists(&args.name, &path)?;

    let mut prompt = PasswordPrompt::new(ctx.interactive());
    let (store_ref, ui_ref) = (&store, &ui);
    let (_password, plaintext) = unlock(&mut prompt, |password: SecretString| {
        let name = args.name.clone();
        async move {
            let _spinner = Spinner::start(ui_ref, "Decrypting");
            let result = store_ref.read(&name, password.expose_secret()).await;
            (password, result)
        }
    })
    .await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&plaintext)
        .and_then(|_| stdout.flush())
        .map_err(|e| anyhow::anyhow!("Failed to write note: {}", e))?;
    Ok(())
}

pub async fn handle_rm(ctx: &AppContext<'_>, args: &RmArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(false, None);
    let store = ctx.store()?;
    let path = store.resolve(&args.name)?;
    ensure_note_exists(&args.name, &path)?;

    if !args.yes {
        if !ctx.interactive() {
            return Err(CliError::invalid_input(format!(
                "Refusing to delete {} without confirmation. Pass --yes.",
                args.name
            ))
            .into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}? This cannot be undone", args.name))
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;
        if !confirmed {
            print(&ui, &badge(&ui, Badge::Warn, "Cancelled"));
            return Ok(());
        }
    }

    store.delete(&args.name).await?;
    record_change(ctx, "Delete", &args.name, path).await;
    if !ctx.quiet() {
        print(&ui, &badge(&ui, Badge::Ok, &format!("Deleted {}", args.name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;
    use chrono::TimeZone;
    use std::path::PathBuf;

    #[test]
    fn test_entry_row_plain() {
        let ui = UiContext {
            color: false,
            unicode: false,
            width: 80,
            mode: OutputMode::Plain,
            animate: false,
        };
        let entry = NoteEntry {
            name: "work/plan".to_string(),
            path: PathBuf::from("/notes/work/plan.enc"),
            size: 2048,
            modified: Some(chrono::Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
            staged: true,
        };
        assert_eq!(
            entry_row(&ui, &entry),
            vec![
                "work/plan".to_string(),
                "2048".to_string(),
                "2026-01-02T03:04:05+00:00".to_string(),
                "staged".to_string(),
            ]
        );
    }
}
