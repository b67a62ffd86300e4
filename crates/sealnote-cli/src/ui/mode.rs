//! Choosing how command output is rendered.

use clap::ValueEnum;

/// Value of `list --format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Bordered table with a header line
    Table,
    /// One tab-separated line per note
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// JSON on stdout and nothing else
    Json,
    /// Tab-separated lines, stable for scripts
    #[default]
    Plain,
    /// Tables, badges and hints
    Pretty,
}

impl OutputMode {
    /// `--json` wins over `--format`. An explicit format is honoured even
    /// when stdout is piped; otherwise tables only go to a capable terminal.
    pub fn resolve(
        json: bool,
        format: Option<ListFormat>,
        stdout_is_tty: bool,
        term_is_dumb: bool,
    ) -> Self {
        match format {
            _ if json => Self::Json,
            Some(ListFormat::Plain) => Self::Plain,
            Some(ListFormat::Table) => Self::Pretty,
            None if stdout_is_tty && !term_is_dumb => Self::Pretty,
            None => Self::Plain,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }
}
