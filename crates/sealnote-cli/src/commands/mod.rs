//! Command handlers, one module per concern.

pub mod edit;
pub mod init;
pub mod misc;
pub mod notes;
