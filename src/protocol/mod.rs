//! FTP Protocol implementation
//!
//! Handles FTP command parsing, dispatch, and reply generation.

pub mod commands;
pub mod handlers;
pub mod replies;

pub use commands::{Command, parse_command};
pub use handlers::{CommandStatus, handle_command};
pub use replies::{Reply, ReplySink};
