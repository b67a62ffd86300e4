//! Sealnote CLI - text notes that stay encrypted at rest
//!
//! This is the command-line interface for Sealnote. Notes are decrypted
//! only into short-lived staging copies while an editor has them open.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod git;
mod helpers;
mod ui;
mod watch;

use clap::{CommandFactory, Parser};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{edit, init, misc, notes};
use crate::errors::{exit_code_for, explain};
use crate::ui::{print_error, UiContext};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli).await {
        let e = explain(e);
        let ui = UiContext::from_env(false, None, cli.no_color, cli.ascii);
        let (message, hint) = split_hint(&e.to_string());
        print_error(&ui, &message, hint.as_deref());
        std::process::exit(exit_code_for(&e));
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, 2) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Separate a trailing "Hint:" line from an error message.
fn split_hint(error: &str) -> (String, Option<String>) {
    match error.find("\nHint:") {
        Some(idx) => (
            error[..idx].to_string(),
            Some(error[idx + "\nHint:".len()..].trim().to_string()),
        ),
        None => (error.to_string(), None),
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Init(args) => init::handle_init(cli, args).await,
        Commands::Completions(args) => misc::handle_completions(args),
        Commands::List(args) => notes::handle_list(&AppContext::load(cli)?, args).await,
        Commands::New(args) => notes::handle_new(&AppContext::load(cli)?, args).await,
        Commands::Edit(args) => edit::handle_edit(&AppContext::load(cli)?, args).await,
        Commands::Show(args) => notes::handle_show(&AppContext::load(cli)?, args).await,
        Commands::Rm(args) => notes::handle_rm(&AppContext::load(cli)?, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_hint() {
        let (message, hint) = split_hint("Note not found: todo\nHint: Run `sealnote list`.");
        assert_eq!(message, "Note not found: todo");
        assert_eq!(hint.as_deref(), Some("Run `sealnote list`."));

        let (message, hint) = split_hint("plain failure");
        assert_eq!(message, "plain failure");
        assert!(hint.is_none());
    }
}
