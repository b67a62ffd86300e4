use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use sealnote_core::VERSION;

use crate::ui::ListFormat;

/// Sealnote - text notes that stay encrypted at rest
#[derive(Parser)]
#[command(name = "sealnote")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Note collection directory (overrides the configured root)
    #[arg(short, long, global = true, env = "SEALNOTE_ROOT")]
    pub root: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Directory that will hold the encrypted notes
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Track the collection in a git repository
    #[arg(long)]
    pub git: bool,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<ListFormat>,
}

/// Arguments for the `new` command
#[derive(Args)]
pub struct NewArgs {
    /// Note name, relative to the collection (e.g. work/plan)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Initial content (skips the editor)
    #[arg(long)]
    pub body: Option<String>,

    /// Create the note without opening the editor
    #[arg(long)]
    pub no_edit: bool,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Note name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Note name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for the `rm` command
#[derive(Args)]
pub struct RmArgs {
    /// Note name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Delete without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up a note collection and write the config file
    Init(InitArgs),

    /// List notes in the collection
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a new encrypted note
    New(NewArgs),

    /// Edit a note in your editor; it is re-encrypted on every save
    Edit(EditArgs),

    /// Print a note's decrypted content
    Show(ShowArgs),

    /// Delete a note
    Rm(RmArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sealnote", "list", "--json", "-vv", "--root", "/tmp/notes", "--no-color",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root.as_deref(), Some("/tmp/notes"));
        assert!(cli.no_color);
        match cli.command {
            Some(Commands::List(args)) => assert!(args.json),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_new_with_body() {
        let cli = Cli::try_parse_from(["sealnote", "new", "work/plan", "--body", "# plan", "--no-edit"])
            .unwrap();
        match cli.command {
            Some(Commands::New(args)) => {
                assert_eq!(args.name, "work/plan");
                assert_eq!(args.body.as_deref(), Some("# plan"));
                assert!(args.no_edit);
            }
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn test_rm_requires_name() {
        assert!(Cli::try_parse_from(["sealnote", "rm"]).is_err());
        let cli = Cli::try_parse_from(["sealnote", "rm", "todo", "-y"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Rm(RmArgs { yes: true, .. }))));
    }

    #[test]
    fn test_list_format_is_checked() {
        let cli = Cli::try_parse_from(["sealnote", "list", "--format", "table"]).unwrap();
        match cli.command {
            Some(Commands::List(args)) => assert_eq!(args.format, Some(ListFormat::Table)),
            _ => panic!("expected list"),
        }
        assert!(Cli::try_parse_from(["sealnote", "list", "--format", "csv"]).is_err());
    }

    #[test]
    fn test_ls_alias() {
        let cli = Cli::try_parse_from(["sealnote", "ls"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::List(_))));
    }
}
