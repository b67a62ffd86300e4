//! What the terminal on the other end can show.

use std::io::IsTerminal;

use super::mode::{ListFormat, OutputMode};

#[derive(Debug, Clone)]
pub struct UiContext {
    pub color: bool,
    pub unicode: bool,
    /// Columns available to tables
    pub width: usize,
    pub mode: OutputMode,
    /// Whether the key-derivation spinner may draw on stderr.
    pub animate: bool,
}

impl UiContext {
    /// Read the terminal and environment for one command.
    ///
    /// The spinner follows stderr rather than stdout, so `sealnote show`
    /// piped into a file still shows progress while the key is derived.
    pub fn from_env(
        json: bool,
        format: Option<ListFormat>,
        no_color_flag: bool,
        ascii_flag: bool,
    ) -> Self {
        let stdout_is_tty = std::io::stdout().is_terminal();
        let stderr_is_tty = std::io::stderr().is_terminal();
        let term_is_dumb = std::env::var("TERM").is_ok_and(|v| v == "dumb");
        let no_color = no_color_flag || std::env::var_os("NO_COLOR").is_some();
        let mode = OutputMode::resolve(json, format, stdout_is_tty, term_is_dumb);

        Self {
            color: stdout_is_tty && !no_color && !term_is_dumb,
            unicode: !ascii_flag,
            width: terminal_width().unwrap_or(80),
            mode,
            animate: stderr_is_tty && !term_is_dumb && !mode.is_json(),
        }
    }
}

/// `COLUMNS` first, then the size of the terminal behind stdout.
fn terminal_width() -> Option<usize> {
    if let Some(width) = std::env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.parse::<usize>().ok())
        .filter(|width| *width > 0)
    {
        return Some(width);
    }

    #[cfg(unix)]
    {
        use std::mem::MaybeUninit;

        let mut winsize = MaybeUninit::<libc::winsize>::uninit();
        // SAFETY: TIOCGWINSZ only writes into the provided winsize struct.
        let result =
            unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, winsize.as_mut_ptr()) };
        if result == 0 {
            // SAFETY: ioctl returned success, so winsize was initialized.
            let ws = unsafe { winsize.assume_init() };
            if ws.ws_col > 0 {
                return Some(ws.ws_col as usize);
            }
        }
    }

    None
}
