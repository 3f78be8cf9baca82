//! Session runner
//!
//! The control-connection read loop: greet, then read one line at a time,
//! dispatch it, and write the reply. The loop never blocks on a transfer
//! it has delegated; RETR/STOR completion replies arrive through the
//! shared reply sink whenever their task finishes.

use std::io;
use std::net::SocketAddr;

use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use crate::protocol::{CommandStatus, Reply, ReplySink, handle_command, parse_command};
use crate::session::Session;
use crate::storage::FileSystem;

/// Drives one control connection to completion.
///
/// Returns `Err` only for control-socket I/O failures; those terminate
/// this session and never affect other sessions. FileSystem and
/// data-channel failures have already been converted to replies by the
/// handlers.
pub async fn run_session<F: FileSystem>(
    stream: TcpStream,
    addr: SocketAddr,
    fs: F,
) -> io::Result<()> {
    info!("{} initiated a new session", addr);
    let bind_ip = stream.local_addr()?.ip();
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let replies = ReplySink::new(write_half);
    let mut session = Session::new(fs, bind_ip);

    replies.send(&Reply::service_ready()).await?;

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let raw = line.trim_end_matches(['\r', '\n']);
        info!("{} got message: {}", addr, raw);

        match parse_command(raw) {
            Ok(command) => {
                let status = handle_command(&mut session, command, &replies).await?;
                if status == CommandStatus::CloseConnection {
                    break;
                }
            }
            Err(e) => {
                debug!("{} sent an unparseable line: {}", addr, e);
                replies.send(&reply_for_parse_error(&e)).await?;
            }
        }
    }

    info!("{} closed session", addr);
    Ok(())
}

fn reply_for_parse_error(error: &crate::error::ParseError) -> Reply {
    match error {
        crate::error::ParseError::UnknownCommand(_) => Reply::command_unrecognized(),
        crate::error::ParseError::MissingArgument(_) => Reply::syntax_error(),
    }
}
