//! Spinner for the slow part of every command: password key derivation.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::context::UiContext;

/// An indeterminate spinner on stderr. Inert outside pretty TTY output.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn start(ctx: &UiContext, message: &str) -> Self {
        if !ctx.animate {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        let frames: &[&str] = if ctx.unicode {
            &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]
        } else {
            &["|", "/", "-", "\\", ""]
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}...") {
            bar.set_style(style.tick_strings(frames));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    pub fn stop(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;

    #[test]
    fn test_spinner_is_inert_without_tty() {
        let ctx = UiContext {
            color: false,
            unicode: true,
            width: 80,
            mode: OutputMode::Plain,
            animate: false,
        };
        let spinner = Spinner::start(&ctx, "Deriving key");
        assert!(spinner.bar.is_none());
        spinner.stop();
    }
}
