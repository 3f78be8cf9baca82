//! Command handlers
//!
//! One handler per verb. Each is a function of (argument, session) to side
//! effects plus exactly one reply, except the data-bearing commands, which
//! emit a short ordered reply sequence and may hand the rest of their work
//! to a transfer task. FileSystem and data-channel failures are converted
//! to replies here; only control-socket write errors propagate.

use std::io;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::{Command, Reply, ReplySink};
use crate::session::Session;
use crate::storage::FileSystem;
use crate::transfer::{Cleanup, task};

/// Whether the control loop keeps reading after this command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Continue,
    CloseConnection,
}

/// Dispatches one parsed command to its handler.
pub async fn handle_command<F, W>(
    session: &mut Session<F>,
    command: Command,
    replies: &ReplySink<W>,
) -> io::Result<CommandStatus>
where
    F: FileSystem,
    W: AsyncWrite + Unpin + Send + 'static,
{
    match command {
        Command::User(name) => handle_user(&name, replies).await?,
        Command::Type(arg) => handle_type(session, &arg, replies).await?,
        Command::Cwd(path) => handle_cwd(session, &path, replies).await?,
        Command::Cdup => handle_cdup(session, replies).await?,
        Command::Pwd => handle_pwd(session, replies).await?,
        Command::List(path) => handle_list(session, path.as_deref(), true, replies).await?,
        Command::Nlst(path) => handle_list(session, path.as_deref(), false, replies).await?,
        Command::Retr(path) => handle_retr(session, &path, replies).await?,
        Command::Stor(path) => handle_stor(session, &path, replies).await?,
        Command::Dele(path) => handle_dele(session, &path, replies).await?,
        Command::Rmd(path) => handle_rmd(session, &path, replies).await?,
        Command::Mkd(path) => handle_mkd(session, &path, replies).await?,
        Command::Epsv => handle_epsv(session, replies).await?,
        Command::Rnfr(path) => handle_rnfr(session, &path, replies).await?,
        Command::Rnto(path) => handle_rnto(session, &path, replies).await?,
        Command::Quit => {
            replies.send(&Reply::closing_control_connection()).await?;
            return Ok(CommandStatus::CloseConnection);
        }
    }
    Ok(CommandStatus::Continue)
}

/// USER: any name is accepted; there is no credential check.
async fn handle_user<W>(name: &str, replies: &ReplySink<W>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    info!("user {} logged in", name);
    replies.send(&Reply::user_logged_in()).await
}

/// TYPE: `I` selects binary (image), `A`/`A N` selects ASCII. Anything
/// else leaves the mode unchanged.
async fn handle_type<F, W>(
    session: &mut Session<F>,
    arg: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match arg.to_ascii_lowercase().as_str() {
        "i" => session.ascii_mode = false,
        "a" | "a n" => session.ascii_mode = true,
        other => {
            warn!("rejected TYPE argument: {}", other);
            return replies.send(&Reply::syntax_error()).await;
        }
    }
    replies.send(&Reply::command_okay()).await
}

async fn handle_cwd<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match session.fs.lock().await.cwd(path).await {
        Ok(()) => replies.send(&Reply::file_action_okay()).await,
        Err(e) => {
            info!("CWD {} failed: {}", path, e);
            replies.send(&Reply::action_not_taken()).await
        }
    }
}

/// CDUP is CWD ".." except that success replies 200, not 250.
async fn handle_cdup<F, W>(session: &mut Session<F>, replies: &ReplySink<W>) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match session.fs.lock().await.cwd("..").await {
        Ok(()) => replies.send(&Reply::command_okay()).await,
        Err(e) => {
            info!("CDUP failed: {}", e);
            replies.send(&Reply::action_not_taken()).await
        }
    }
}

async fn handle_pwd<F, W>(session: &mut Session<F>, replies: &ReplySink<W>) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    let cwd = session.fs.lock().await.pwd();
    replies
        .send(&Reply::pathname_created(format!(
            "\"{}\" is current directory",
            cwd
        )))
        .await
}

/// LIST/NLST: resolve the entries first, then open the data channel and
/// write them synchronously. The control loop blocks until the listing is
/// done, unlike RETR/STOR.
async fn handle_list<F, W>(
    session: &mut Session<F>,
    path: Option<&str>,
    long: bool,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    let entries = match session.fs.lock().await.list(path, long).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("listing failed: {}", e);
            return replies.send(&Reply::file_action_not_taken()).await;
        }
    };
    replies.send(&Reply::file_status_okay()).await?;
    let Some(mut data) = claim_data_connection(session, replies).await? else {
        return Ok(());
    };
    match write_listing(&mut data, &entries).await {
        Ok(()) => replies.send(&Reply::closing_data_connection()).await,
        Err(e) => {
            warn!("failed to write listing: {}", e);
            replies.send(&Reply::transfer_aborted()).await
        }
    }
}

async fn write_listing(data: &mut TcpStream, entries: &[String]) -> io::Result<()> {
    for entry in entries {
        data.write_all(entry.as_bytes()).await?;
        data.write_all(b"\r\n").await?;
    }
    data.shutdown().await
}

/// RETR: open the file stream, then hand file-to-socket copying to a
/// transfer task. Nothing was created, so there is no failure cleanup.
async fn handle_retr<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let reader = match session.fs.lock().await.retr(path).await {
        Ok(reader) => reader,
        Err(e) => {
            info!("RETR {} failed: {}", path, e);
            return replies.send(&Reply::action_not_taken()).await;
        }
    };
    replies.send(&Reply::file_status_okay()).await?;
    let Some(data) = claim_data_connection(session, replies).await? else {
        return Ok(());
    };
    let handle = task::spawn_transfer(
        reader,
        data,
        session.ascii_mode,
        task::CRLF,
        replies.clone(),
        None,
    );
    session.transfer = Some(handle);
    Ok(())
}

/// STOR: open the target stream, then hand socket-to-file copying to a
/// transfer task. A failed transfer deletes the partial target; a failed
/// delete is logged, never surfaced to the client.
async fn handle_stor<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = match session.fs.lock().await.stor(path).await {
        Ok(writer) => writer,
        Err(e) => {
            info!("STOR {} failed: {}", path, e);
            return replies.send(&Reply::action_not_taken()).await;
        }
    };
    replies.send(&Reply::file_status_okay()).await?;
    let Some(data) = claim_data_connection(session, replies).await? else {
        return Ok(());
    };
    let fs = Arc::clone(&session.fs);
    let target = path.to_string();
    let cleanup: Cleanup = Box::pin(async move {
        if let Err(e) = fs.lock().await.dele(&target).await {
            warn!("failed to remove partial upload {}: {}", target, e);
        }
    });
    let handle = task::spawn_transfer(
        data,
        writer,
        session.ascii_mode,
        task::NATIVE_NEWLINE,
        replies.clone(),
        Some(cleanup),
    );
    session.transfer = Some(handle);
    Ok(())
}

async fn handle_dele<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match session.fs.lock().await.dele(path).await {
        Ok(()) => replies.send(&Reply::file_action_okay()).await,
        Err(e) => {
            info!("DELE {} failed: {}", path, e);
            replies.send(&Reply::action_not_taken()).await
        }
    }
}

async fn handle_rmd<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match session.fs.lock().await.rmd(path).await {
        Ok(()) => replies.send(&Reply::file_action_okay()).await,
        Err(e) => {
            info!("RMD {} failed: {}", path, e);
            replies.send(&Reply::action_not_taken()).await
        }
    }
}

async fn handle_mkd<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match session.fs.lock().await.mkd(path).await {
        Ok(()) => {
            replies
                .send(&Reply::pathname_created(format!("\"{}\" created", path)))
                .await
        }
        Err(e) => {
            info!("MKD {} failed: {}", path, e);
            replies.send(&Reply::action_not_taken()).await
        }
    }
}

/// EPSV: arm a passive listener and advertise its port. A bind failure
/// replies 500; odd for a resource problem, but it is the observed wire
/// behavior and clients depend on replies, so it stays.
async fn handle_epsv<F, W>(session: &mut Session<F>, replies: &ReplySink<W>) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match session.data_channel.open_passive_listener().await {
        Ok(port) => replies.send(&Reply::entering_passive_mode(port)).await,
        Err(e) => {
            error!("failed to open passive listener: {}", e);
            replies.send(&Reply::command_unrecognized()).await
        }
    }
}

async fn handle_rnfr<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    session.rename_from = Some(path.to_string());
    replies.send(&Reply::file_action_pending()).await
}

/// RNTO: consumes the staged rename source. The source is cleared whether
/// or not the rename succeeds, so a later bare RNTO cannot silently reuse
/// a stale path.
async fn handle_rnto<F, W>(
    session: &mut Session<F>,
    path: &str,
    replies: &ReplySink<W>,
) -> io::Result<()>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    let Some(from) = session.rename_from.take() else {
        return replies.send(&Reply::bad_sequence()).await;
    };
    match session.fs.lock().await.rename(&from, path).await {
        Ok(()) => replies.send(&Reply::file_action_okay()).await,
        Err(e) => {
            info!("rename {} -> {} failed: {}", from, path, e);
            replies.send(&Reply::name_not_allowed()).await
        }
    }
}

/// Waits for the client on the armed passive listener. On failure the 425
/// has already been sent; the caller performs no further action for the
/// command.
async fn claim_data_connection<F, W>(
    session: &mut Session<F>,
    replies: &ReplySink<W>,
) -> io::Result<Option<TcpStream>>
where
    F: FileSystem,
    W: AsyncWrite + Unpin,
{
    match session.data_channel.claim().await {
        Ok(stream) => Ok(Some(stream)),
        Err(e) => {
            warn!("data connection unavailable: {}", e);
            replies.send(&Reply::cant_open_data_connection()).await?;
            Ok(None)
        }
    }
}
