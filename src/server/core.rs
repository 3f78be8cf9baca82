//! Server accept loop
//!
//! Binds the control listener and spawns one session task per accepted
//! connection. A session failure is contained to its own task; the accept
//! loop keeps running.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::server::config::ServerConfig;
use crate::session;
use crate::storage::LocalFs;

pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the control listener; a bind failure is fatal at startup.
    pub async fn new(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.control_socket()).await?;
        info!("server bound to {}", listener.local_addr()?);

        if let Err(e) = std::fs::create_dir_all(&config.server_root) {
            warn!("failed to create server root directory: {}", e);
        } else {
            info!("server root directory: {}", config.server_root_str());
        }

        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// The bound address; useful when the configured port is 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!("starting FTP server on {}", self.config.control_socket());
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let root = self.config.server_root.clone();
                    // One task per control connection; the session owns it.
                    tokio::spawn(async move {
                        let fs = match LocalFs::new(&root) {
                            Ok(fs) => fs,
                            Err(e) => {
                                error!("cannot serve {}: root unavailable: {}", addr, e);
                                return;
                            }
                        };
                        if let Err(e) = session::run_session(stream, addr, fs).await {
                            warn!("session {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("error accepting connection: {}", e);
                }
            }
        }
    }
}
