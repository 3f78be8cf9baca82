//! Module `task`
//!
//! The data-transfer copy loop. Each RETR/STOR spawns one task that runs
//! independently of the control loop, copying bytes (or translated lines)
//! between a FileSystem stream and the data socket, and reporting its
//! outcome on the control channel when it finishes.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

use crate::protocol::{Reply, ReplySink};

/// Chunk size for binary (image) mode copies.
const CHUNK_SIZE: usize = 1024;

/// Line terminator written towards the network in ASCII mode.
pub const CRLF: &str = "\r\n";

/// Line terminator written towards local storage in ASCII mode.
pub const NATIVE_NEWLINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Deferred action run only if the transfer fails; STOR uses it to delete
/// the partially written target.
pub type Cleanup = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handle to an in-flight (or finished) transfer task.
///
/// The session retains it so a running transfer stays observable and can
/// be cancelled between copy iterations.
pub struct TransferHandle {
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TransferHandle {
    /// Requests cancellation; honored at the next copy iteration and then
    /// reported like an I/O failure.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the task to finish. Completion replies have been written
    /// to the control channel once this returns.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

/// Starts the copy loop on its own task and returns immediately.
///
/// The ASCII flag is latched here; a TYPE issued mid-transfer does not
/// affect a running copy. On success the task replies 226; on failure it
/// runs the cleanup action and replies 426, plus a trailing 226 when the
/// failure was a cancellation (observed wire behavior, kept).
pub fn spawn_transfer<R, S, W>(
    source: R,
    sink: S,
    ascii: bool,
    newline: &'static str,
    replies: ReplySink<W>,
    on_failure: Option<Cleanup>,
) -> TransferHandle
where
    R: AsyncRead + Unpin + Send + 'static,
    S: AsyncWrite + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let task = tokio::spawn(async move {
        match run_copy(source, sink, ascii, newline, &flag).await {
            Ok(()) => {
                let _ = replies.send(&Reply::closing_data_connection()).await;
            }
            Err(e) => {
                warn!("data transfer aborted: {}", e);
                if let Some(cleanup) = on_failure {
                    cleanup.await;
                }
                let _ = replies.send(&Reply::transfer_aborted()).await;
                if flag.load(Ordering::Relaxed) {
                    let _ = replies.send(&Reply::closing_data_connection()).await;
                }
            }
        }
    });
    TransferHandle { cancel, task }
}

/// Copies source to sink, then closes both streams on every exit path.
/// Secondary close errors are logged, never reported to the client.
async fn run_copy<R, S>(
    source: R,
    mut sink: S,
    ascii: bool,
    newline: &str,
    cancel: &AtomicBool,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    S: AsyncWrite + Unpin,
{
    let result = if ascii {
        copy_lines(source, &mut sink, newline, cancel).await
    } else {
        copy_chunks(source, &mut sink, cancel).await
    };
    if let Err(e) = sink.shutdown().await {
        debug!("error closing data sink: {}", e);
    }
    // Source closes on drop.
    result
}

/// ASCII mode: line-by-line with terminator translation, flushed per line.
async fn copy_lines<R, S>(
    source: R,
    sink: &mut S,
    newline: &str,
    cancel: &AtomicBool,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    S: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut line = String::new();
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(cancelled());
        }
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let stripped = line.trim_end_matches(['\r', '\n']);
        sink.write_all(stripped.as_bytes()).await?;
        sink.write_all(newline.as_bytes()).await?;
        sink.flush().await?;
    }
}

/// Binary (image) mode: fixed-size chunks, verbatim.
async fn copy_chunks<R, S>(source: R, sink: &mut S, cancel: &AtomicBool) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    S: AsyncWrite + Unpin,
{
    let mut source = source;
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(cancelled());
        }
        let n = source.read(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }
        sink.write_all(&buffer[..n]).await?;
    }
}

fn cancelled() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "transfer cancelled")
}
