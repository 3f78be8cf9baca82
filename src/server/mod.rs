//! Server core functionality
//!
//! The control-connection accept loop and server configuration.

pub mod config;
pub mod core;

pub use config::ServerConfig;
pub use core::Server;
