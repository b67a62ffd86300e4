//! Password acquisition.
//!
//! The password comes from `SEALNOTE_PASSWORD` or an interactive prompt and
//! lives in a `SecretString` for the rest of the invocation.

use std::future::Future;

use dialoguer::Password;
use secrecy::SecretString;

use sealnote_core::crypto::validate_new_password;

use crate::constants::MAX_PASSWORD_ATTEMPTS;
use crate::errors::CliError;

fn env_password() -> Option<SecretString> {
    std::env::var("SEALNOTE_PASSWORD")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Password source for an existing collection, with bounded retries.
pub struct PasswordPrompt {
    interactive: bool,
    attempts: u32,
    from_env: bool,
}

impl PasswordPrompt {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            attempts: 0,
            from_env: false,
        }
    }

    pub fn next(&mut self) -> anyhow::Result<SecretString> {
        self.attempts += 1;
        if let Some(password) = env_password() {
            self.from_env = true;
            return Ok(password);
        }
        if !self.interactive {
            return Err(CliError::invalid_input(
                "No password provided and no TTY available. Set SEALNOTE_PASSWORD.",
            )
            .into());
        }
        Password::new()
            .with_prompt("Password")
            .interact()
            .map(SecretString::from)
            .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
    }

    /// Record a rejected password; errors once no attempts remain.
    pub fn rejected(&self) -> anyhow::Result<()> {
        let remaining = if self.from_env || !self.interactive {
            0
        } else {
            MAX_PASSWORD_ATTEMPTS.saturating_sub(self.attempts)
        };
        if remaining == 0 {
            return Err(CliError::auth_failed_with_hint(
                "Decryption failed: wrong password or corrupted note.",
                "Hint: Notes cannot be recovered without their password.",
            )
            .into());
        }
        eprintln!(
            "Wrong password. {} attempt{} remaining.",
            remaining,
            if remaining == 1 { "" } else { "s" }
        );
        Ok(())
    }
}

/// Run `attempt` with passwords from `prompt` until it stops failing with a
/// decryption error. Returns the accepted password with the result.
pub async fn unlock<T, F, Fut>(
    prompt: &mut PasswordPrompt,
    mut attempt: F,
) -> anyhow::Result<(SecretString, T)>
where
    F: FnMut(SecretString) -> Fut,
    Fut: Future<Output = (SecretString, sealnote_core::Result<T>)>,
{
    loop {
        let password = prompt.next()?;
        let (password, result) = attempt(password).await;
        match result {
            Ok(value) => return Ok((password, value)),
            Err(err) if err.is_decryption() => prompt.rejected()?,
            Err(err) => return Err(err.into()),
        }
    }
}

/// Password for a collection with no notes yet, confirmed when prompted.
pub fn prompt_new_password(interactive: bool) -> anyhow::Result<SecretString> {
    let password = match std::env::var("SEALNOTE_PASSWORD") {
        Ok(value) if !value.trim().is_empty() => value,
        _ if !interactive => {
            return Err(CliError::invalid_input(
                "No password provided and no TTY available. Set SEALNOTE_PASSWORD.",
            )
            .into())
        }
        _ => Password::new()
            .with_prompt("New password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?,
    };
    validate_new_password(&password).map_err(|e| CliError::invalid_input(e.to_string()))?;
    Ok(SecretString::from(password))
}
