//! FTP Reply model
//!
//! Maps the closed set of protocol outcomes to canonical FTP reply codes.
//! Replies are constructed at the point of decision, written once to the
//! control stream, and discarded.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// A single reply line: numeric status code plus human-readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn service_ready() -> Self {
        Self::new(220, "Service ready")
    }

    pub fn closing_control_connection() -> Self {
        Self::new(221, "Service closing control connection")
    }

    pub fn user_logged_in() -> Self {
        Self::new(230, "User logged in, proceed")
    }

    pub fn command_okay() -> Self {
        Self::new(200, "Command okay")
    }

    /// About to open the data connection; transfer starting.
    pub fn file_status_okay() -> Self {
        Self::new(125, "Data connection already open; transfer starting")
    }

    pub fn closing_data_connection() -> Self {
        Self::new(226, "Closing data connection")
    }

    pub fn file_action_okay() -> Self {
        Self::new(250, "Requested file action okay, completed")
    }

    pub fn pathname_created(text: impl Into<String>) -> Self {
        Self::new(257, text)
    }

    pub fn entering_passive_mode(port: u16) -> Self {
        Self::new(229, format!("entering passive mode (|||{}|)", port))
    }

    /// Rename staged; waiting for RNTO.
    pub fn file_action_pending() -> Self {
        Self::new(350, "Requested file action pending further information")
    }

    pub fn syntax_error() -> Self {
        Self::new(501, "Syntax error in parameters or arguments")
    }

    pub fn command_unrecognized() -> Self {
        Self::new(500, "Syntax error, command unrecognized")
    }

    pub fn bad_sequence() -> Self {
        Self::new(503, "Bad sequence of commands")
    }

    pub fn cant_open_data_connection() -> Self {
        Self::new(425, "Can't open data connection")
    }

    pub fn transfer_aborted() -> Self {
        Self::new(426, "Connection closed; transfer aborted")
    }

    pub fn action_not_taken() -> Self {
        Self::new(550, "Requested action not taken")
    }

    pub fn file_action_not_taken() -> Self {
        Self::new(450, "Requested file action not taken")
    }

    pub fn name_not_allowed() -> Self {
        Self::new(553, "Requested action not taken, file name not allowed")
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

/// Shared writer for the control connection.
///
/// The session runner and any in-flight transfer task both hold a handle;
/// the mutex serializes reply lines so they never interleave mid-line.
#[derive(Debug)]
pub struct ReplySink<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for ReplySink<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: AsyncWrite + Unpin> ReplySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Writes one reply line terminated by CRLF and flushes it.
    pub async fn send(&self, reply: &Reply) -> io::Result<()> {
        let mut writer = self.inner.lock().await;
        writer
            .write_all(format!("{}\r\n", reply).as_bytes())
            .await?;
        writer.flush().await
    }
}

#[cfg(test)]
impl ReplySink<std::io::Cursor<Vec<u8>>> {
    /// Everything written so far, for assertions.
    pub(crate) async fn contents(&self) -> String {
        String::from_utf8(self.inner.lock().await.get_ref().clone()).unwrap()
    }
}
