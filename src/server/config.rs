//! Server configuration
//!
//! Loaded once at startup from an optional `oxide-ftp` config file with
//! `OXIDE_FTP_*` environment overrides. Every value has a default so the
//! server runs with no configuration present.

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface for the control listener; passive data listeners bind to
    /// the per-connection local address instead.
    pub bind_address: String,
    pub control_port: u16,
    /// Directory tree served to clients.
    pub server_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            server_root: PathBuf::from("./server_root"),
        }
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("control_port", 2121)?
            .set_default("server_root", "./server_root")?
            .add_source(File::with_name("oxide-ftp").required(false))
            .add_source(Environment::with_prefix("OXIDE_FTP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Bind address and control port as one socket address string.
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    pub fn server_root_str(&self) -> String {
        self.server_root.to_string_lossy().to_string()
    }
}
