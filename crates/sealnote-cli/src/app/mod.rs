//! Application-level plumbing for the Sealnote CLI.
//!
//! - Path resolution for the config file and the collection
//! - The per-invocation context (config, store, editor, VCS)
//! - Password acquisition with retry

mod context;
mod password;
mod resolver;

pub use context::AppContext;
pub use password::{prompt_new_password, unlock, PasswordPrompt};
pub use resolver::resolve_config_path;
