//! UI primitives for the Sealnote CLI.
//!
//! - **Context**: Terminal detection for stdout and stderr
//! - **Mode**: `--json`/`--format` resolution
//! - **Theme**: Badge tokens and text styles
//! - **Render**: Tables, headers, badges, hints
//! - **Progress**: Spinner shown while a key is derived
//! - **Format**: Sizes and timestamps

mod context;
pub mod format;
mod mode;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::{ListFormat, OutputMode};
pub use theme::Badge;

pub use render::{badge, hint, kv, print, print_error, simple_table, Column};

pub use progress::Spinner;

pub use format::{format_bytes, format_datetime};
