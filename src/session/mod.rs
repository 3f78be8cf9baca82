//! Session management
//!
//! Per-control-connection state and the control-loop runner.

pub mod runner;

pub use runner::run_session;

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::storage::FileSystem;
use crate::transfer::{DataChannel, TransferHandle};

/// State for one control connection, owned by its runner task.
///
/// `rename_from` and the armed data channel are each populated by exactly
/// one command and consumed by exactly one following command. The
/// FileSystem sits behind a lock because a failed STOR deletes its partial
/// target from the transfer task while the control loop keeps running.
pub struct Session<F: FileSystem> {
    pub fs: Arc<Mutex<F>>,
    /// Transfer mode; binary (image) by default, mutated only by TYPE.
    pub ascii_mode: bool,
    /// Rename source staged by RNFR, consumed by RNTO.
    pub rename_from: Option<String>,
    pub data_channel: DataChannel,
    /// The in-flight (or most recently run) transfer task.
    pub transfer: Option<TransferHandle>,
}

impl<F: FileSystem> Session<F> {
    /// `bind_ip` is the control connection's local address; passive
    /// listeners bind to the same interface.
    pub fn new(fs: F, bind_ip: IpAddr) -> Self {
        Self {
            fs: Arc::new(Mutex::new(fs)),
            ascii_mode: false,
            rename_from: None,
            data_channel: DataChannel::new(bind_ip),
            transfer: None,
        }
    }
}
