//! Storage backend
//!
//! The `FileSystem` capability consumed by the command handlers. The
//! session's working directory lives behind this trait; handlers only
//! forward to it and convert failures into replies.

pub mod local;

pub use local::LocalFs;

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

/// Capability surface the control plane calls into.
///
/// Every operation is scoped to the session's current directory. All
/// methods are fallible via `io::Result` except `pwd`; futures are `Send`
/// so transfer tasks can hold the backend across await points.
pub trait FileSystem: Send + 'static {
    type Reader: AsyncRead + Unpin + Send + 'static;
    type Writer: AsyncWrite + Unpin + Send + 'static;

    /// Current working directory as a virtual absolute path.
    fn pwd(&self) -> String;

    /// Changes the working directory.
    fn cwd(&mut self, path: &str) -> impl Future<Output = io::Result<()>> + Send;

    /// Directory entries, bare names or long form, in listing order.
    fn list(
        &self,
        path: Option<&str>,
        long: bool,
    ) -> impl Future<Output = io::Result<Vec<String>>> + Send;

    /// Opens a read stream for a download.
    fn retr(&self, path: &str) -> impl Future<Output = io::Result<Self::Reader>> + Send;

    /// Opens a write stream for an upload.
    fn stor(&self, path: &str) -> impl Future<Output = io::Result<Self::Writer>> + Send;

    fn dele(&self, path: &str) -> impl Future<Output = io::Result<()>> + Send;

    fn rmd(&self, path: &str) -> impl Future<Output = io::Result<()>> + Send;

    fn mkd(&self, path: &str) -> impl Future<Output = io::Result<()>> + Send;

    fn rename(&self, from: &str, to: &str) -> impl Future<Output = io::Result<()>> + Send;
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory `FileSystem` used by handler tests. Records every call so
    //! tests can assert on invocation counts and arguments.

    use super::FileSystem;
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::task::{Context, Poll, ready};
    use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

    /// Read side handed out by [`StubFs::retr`].
    pub enum StubReader {
        Data(Cursor<Vec<u8>>),
        /// Yields its bytes, then fails the next read.
        FailAfter(Cursor<Vec<u8>>),
    }

    impl AsyncRead for StubReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match &mut *self {
                StubReader::Data(cursor) => Pin::new(cursor).poll_read(cx, buf),
                StubReader::FailAfter(cursor) => {
                    let before = buf.filled().len();
                    ready!(Pin::new(cursor).poll_read(cx, buf))?;
                    if buf.filled().len() == before {
                        Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "simulated read failure",
                        )))
                    } else {
                        Poll::Ready(Ok(()))
                    }
                }
            }
        }
    }

    /// Write side handed out by [`StubFs::stor`].
    pub enum StubWriter {
        Sink(Cursor<Vec<u8>>),
        Fail,
    }

    impl AsyncWrite for StubWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            match &mut *self {
                StubWriter::Sink(cursor) => Pin::new(cursor).poll_write(cx, buf),
                StubWriter::Fail => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "simulated write failure",
                ))),
            }
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Default)]
    pub struct StubFs {
        pub cwd: String,
        pub cwd_fails: bool,
        pub entries: Option<Vec<String>>,
        pub retr_data: Option<Vec<u8>>,
        pub retr_fails_mid_stream: bool,
        pub stor_accepts: bool,
        pub stor_fails_mid_stream: bool,
        pub rename_fails: bool,
        pub dele_fails: bool,
        /// One entry per FileSystem call, e.g. `"rename a b"`.
        pub calls: std::sync::Mutex<Vec<String>>,
    }

    impl StubFs {
        pub fn with_cwd(cwd: &str) -> Self {
            Self {
                cwd: cwd.to_string(),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn fail(what: &str) -> io::Error {
            io::Error::new(io::ErrorKind::NotFound, format!("stub: {what} failed"))
        }
    }

    impl FileSystem for StubFs {
        type Reader = StubReader;
        type Writer = StubWriter;

        fn pwd(&self) -> String {
            self.cwd.clone()
        }

        async fn cwd(&mut self, path: &str) -> io::Result<()> {
            self.record(format!("cwd {path}"));
            if self.cwd_fails {
                return Err(Self::fail("cwd"));
            }
            self.cwd = path.to_string();
            Ok(())
        }

        async fn list(&self, path: Option<&str>, long: bool) -> io::Result<Vec<String>> {
            self.record(format!("list {:?} long={long}", path));
            self.entries.clone().ok_or_else(|| Self::fail("list"))
        }

        async fn retr(&self, path: &str) -> io::Result<StubReader> {
            self.record(format!("retr {path}"));
            let data = self.retr_data.clone().ok_or_else(|| Self::fail("retr"))?;
            if self.retr_fails_mid_stream {
                Ok(StubReader::FailAfter(Cursor::new(data)))
            } else {
                Ok(StubReader::Data(Cursor::new(data)))
            }
        }

        async fn stor(&self, path: &str) -> io::Result<StubWriter> {
            self.record(format!("stor {path}"));
            if !self.stor_accepts {
                return Err(Self::fail("stor"));
            }
            if self.stor_fails_mid_stream {
                Ok(StubWriter::Fail)
            } else {
                Ok(StubWriter::Sink(Cursor::new(Vec::new())))
            }
        }

        async fn dele(&self, path: &str) -> io::Result<()> {
            self.record(format!("dele {path}"));
            if self.dele_fails {
                return Err(Self::fail("dele"));
            }
            Ok(())
        }

        async fn rmd(&self, path: &str) -> io::Result<()> {
            self.record(format!("rmd {path}"));
            Ok(())
        }

        async fn mkd(&self, path: &str) -> io::Result<()> {
            self.record(format!("mkd {path}"));
            Ok(())
        }

        async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
            self.record(format!("rename {from} {to}"));
            if self.rename_fails {
                return Err(Self::fail("rename"));
            }
            Ok(())
        }
    }
}
