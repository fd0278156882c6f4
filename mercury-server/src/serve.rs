//! The TCP serving loop: abridged transport framing in front of the
//! sans-IO [`Connection`].

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::api::ServerApi;
use crate::connection::Connection;

/// A connection must finish its handshake within this long.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept clients forever.
pub async fn serve(api: Arc<ServerApi>) -> std::io::Result<()> {
    let listener = TcpListener::bind(&api.config().listen_address).await?;
    log::info!(target: "remote.connection", "listening on {}", api.config().listen_address);

    loop {
        let (stream, peer) = listener.accept().await?;
        let api = Arc::clone(&api);
        tokio::spawn(async move {
            log::info!(target: "remote.connection", "{peer} connected");
            match handle_client(stream, api).await {
                Ok(()) => log::info!(target: "remote.connection", "{peer} disconnected"),
                Err(e) => log::info!(target: "remote.connection", "{peer} dropped: {e}"),
            }
            // The socket is released here on every path.
        });
    }
}

async fn handle_client(mut stream: TcpStream, api: Arc<ServerApi>) -> std::io::Result<()> {
    let mut conn = Connection::new(api);
    let mut init_seen = false;

    loop {
        let read = read_abridged_frame(&mut stream, &mut init_seen);
        // Outstanding work is cancelled with the task; the session is
        // preserved for a reattach.
        let frame = if conn.is_authenticated() {
            read.await?
        } else {
            timeout(HANDSHAKE_TIMEOUT, read).await.map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "handshake timed out")
            })??
        };

        for reply in conn.process_packet(&frame) {
            write_abridged_frame(&mut stream, &reply).await?;
        }
        if conn.is_failed() {
            return Ok(());
        }
    }
}

/// Read one abridged-framed packet. The first byte a client ever sends is
/// the `0xef` transport marker, consumed once.
async fn read_abridged_frame(
    stream: &mut TcpStream,
    init_seen: &mut bool,
) -> std::io::Result<Vec<u8>> {
    let mut first = [0u8; 1];
    stream.read_exact(&mut first).await?;
    if !*init_seen {
        *init_seen = true;
        if first[0] == 0xef {
            stream.read_exact(&mut first).await?;
        }
    }

    let words = if first[0] < 0x7f {
        first[0] as usize
    } else {
        let mut ext = [0u8; 3];
        stream.read_exact(&mut ext).await?;
        ext[0] as usize | (ext[1] as usize) << 8 | (ext[2] as usize) << 16
    };

    let mut frame = vec![0u8; words * 4];
    stream.read_exact(&mut frame).await?;
    Ok(frame)
}

async fn write_abridged_frame(stream: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    let words = data.len() / 4;
    if words < 0x7f {
        stream.write_all(&[words as u8]).await?;
    } else {
        stream
            .write_all(&[0x7f, words as u8, (words >> 8) as u8, (words >> 16) as u8])
            .await?;
    }
    stream.write_all(data).await?;
    stream.flush().await
}
