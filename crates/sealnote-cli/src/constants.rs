//! Constants used throughout the CLI.

use std::time::Duration;

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (clap usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, collection, note).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong password or corrupted note).
    pub const AUTH_FAILED: i32 = 5;

    /// The note is open for editing in another session.
    pub const ALREADY_OPEN: i32 = 6;
}

/// Quiet period after a save event before the note is re-encrypted.
///
/// Editors often write a file in several steps (truncate, write, rename).
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Password attempts allowed at an interactive prompt.
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;
