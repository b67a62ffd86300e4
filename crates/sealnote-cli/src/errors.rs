//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes; everything else exits with 1.

use std::fmt;

use sealnote_core::NoteError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, collection, note)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong password, too many attempts)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),

    /// The note is being edited elsewhere
    AlreadyOpen { message: String, hint: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::AlreadyOpen { message, hint } => write!(f, "{}\n{}", message, hint),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::AlreadyOpen { .. } => exit_codes::ALREADY_OPEN,
        }
    }
}

/// Attach user-facing guidance to core errors that need it.
pub fn explain(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<NoteError>() {
        Some(NoteError::AlreadyOpen { path, claim }) => CliError::AlreadyOpen {
            message: format!("{} is already open for editing", path.display()),
            hint: format!(
                "Hint: Finish the other edit first. If no other sealnote is running, delete {}.",
                claim.display()
            ),
        }
        .into(),
        _ => err,
    }
}

/// Exit code for any error that reached `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    match err.downcast_ref::<NoteError>() {
        Some(NoteError::NoteNotFound(_)) => exit_codes::NOT_FOUND,
        Some(NoteError::Decryption) => exit_codes::AUTH_FAILED,
        Some(NoteError::InvalidInput(_)) | Some(NoteError::NoteExists(_)) => {
            exit_codes::INVALID_INPUT
        }
        Some(NoteError::AlreadyOpen { .. }) => exit_codes::ALREADY_OPEN,
        _ => 1,
    }
}
