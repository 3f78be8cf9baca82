//! Module `data_channel`
//!
//! Owns the passive-mode listener for one session. EPSV arms a one-shot
//! listener on an ephemeral port; the next data-bearing command claims the
//! accepted socket. A second claim without a fresh EPSV fails.

use std::net::IpAddr;

use log::debug;
use tokio::net::{TcpListener, TcpStream};

use crate::error::TransferError;

pub struct DataChannel {
    bind_ip: IpAddr,
    listener: Option<TcpListener>,
}

impl DataChannel {
    pub fn new(bind_ip: IpAddr) -> Self {
        Self {
            bind_ip,
            listener: None,
        }
    }

    /// Binds an ephemeral port and arms a one-shot accept, returning the
    /// port to advertise in the EPSV reply. Re-arming replaces any
    /// previously armed listener.
    pub async fn open_passive_listener(&mut self) -> Result<u16, TransferError> {
        let listener = TcpListener::bind((self.bind_ip, 0))
            .await
            .map_err(TransferError::PortBindingFailed)?;
        let port = listener
            .local_addr()
            .map_err(TransferError::PortBindingFailed)?
            .port();
        debug!("passive listener armed on port {}", port);
        self.listener = Some(listener);
        Ok(port)
    }

    /// Waits for the client to connect to the armed listener and hands the
    /// socket to the caller. Consumes the listener either way.
    pub async fn claim(&mut self) -> Result<TcpStream, TransferError> {
        let listener = self.listener.take().ok_or(TransferError::NotNegotiated)?;
        let (stream, peer) = listener.accept().await.map_err(TransferError::AcceptFailed)?;
        debug!("data connection accepted from {}", peer);
        Ok(stream)
    }

    pub fn is_armed(&self) -> bool {
        self.listener.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use std::net::Ipv4Addr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn channel() -> DataChannel {
        DataChannel::new(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[tokio::test]
    async fn claim_without_negotiation_fails() {
        let mut chan = channel();
        assert!(matches!(
            chan.claim().await,
            Err(TransferError::NotNegotiated)
        ));
    }

    #[tokio::test]
    async fn armed_listener_accepts_exactly_one_connection() {
        let mut chan = channel();
        let port = chan.open_passive_listener().await.unwrap();
        assert!(chan.is_armed());

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut server_side = chan.claim().await.unwrap();
        assert!(!chan.is_armed());

        server_side.write_all(b"ping").await.unwrap();
        server_side.shutdown().await.unwrap();
        let mut got = String::new();
        client.read_to_string(&mut got).await.unwrap();
        assert_eq!(got, "ping");

        // The listener was one-shot; a second claim needs a fresh EPSV.
        assert!(matches!(
            chan.claim().await,
            Err(TransferError::NotNegotiated)
        ));
    }

    #[tokio::test]
    async fn rearming_replaces_the_listener() {
        let mut chan = channel();
        let first = chan.open_passive_listener().await.unwrap();
        let second = chan.open_passive_listener().await.unwrap();
        assert_ne!(first, second);

        // Only the most recent port is claimable.
        let _client = TcpStream::connect(("127.0.0.1", second)).await.unwrap();
        assert!(chan.claim().await.is_ok());
    }
}
