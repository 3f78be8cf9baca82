//! Oxide FTP Server - Entry Point
//!
//! A Rust FTP server implementing the control/data channel core of RFC 959.

use log::{error, info};

use oxide_ftp_server::Server;
use oxide_ftp_server::server::ServerConfig;

#[tokio::main]
async fn main() {
    // env_logger picks up the RUST_LOG environment variable
    env_logger::init();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Launching FTP server on {}", config.control_socket());

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    server.start().await;
}
