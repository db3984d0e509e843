//! Proxy listener: accepts client connections and serves one request each.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::request::{parse_request_line, BAD_GATEWAY_RESPONSE, NOT_FOUND_RESPONSE};
use crate::error::ProxyError;
use crate::service::ResolutionService;

/// How long a finished connection waits for the client to close its side.
const LINGER: Duration = Duration::from_secs(1);

/// Longest request line the listener reads, newline included.
pub const MAX_REQUEST_LINE: usize = 8 * 1024;

/// Accepts connections forever, serving each in its own task.
///
/// At most `max_connections` are served at once; further clients wait in the
/// listen backlog. Accept failures are logged and never end the loop.
pub async fn serve(listener: TcpListener, service: ResolutionService, max_connections: usize) {
    let permits = Arc::new(Semaphore::new(max_connections.max(1)));
    if let Ok(addr) = listener.local_addr() {
        info!("Proxy listening on {}", addr);
    }

    loop {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!("Connection limiter closed, stopping listener");
                return;
            }
        };

        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, &service).await {
                error!("Connection from {} failed: {}", peer, e);
            }
            drop(permit);
        });
    }
}

/// Reads one request line, resolves it and writes the response.
///
/// Lines that are not a GET get no reply, and neither does a line longer
/// than [`MAX_REQUEST_LINE`]. The upstream fetch runs to completion even if
/// the client goes away meanwhile.
pub async fn handle_connection(
    socket: TcpStream,
    service: &ResolutionService,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(socket);
    let line = read_request_line(&mut reader).await?;

    let socket = reader.get_mut();
    match line.as_deref().and_then(parse_request_line) {
        Some(key) => match service.resolve(&key).await {
            Ok(resolution) => socket.write_all(&resolution.payload).await?,
            Err(ProxyError::NotFound(_)) => socket.write_all(NOT_FOUND_RESPONSE).await?,
            Err(e) => {
                warn!("Answering '{}' with 502: {}", key, e);
                socket.write_all(BAD_GATEWAY_RESPONSE).await?
            }
        },
        None => debug!("Ignoring request line that is not a GET"),
    }
    socket.shutdown().await?;

    // Drain what the client still sends so closing does not reset the
    // connection before it has read the response.
    let mut sink = tokio::io::sink();
    let _ = tokio::time::timeout(LINGER, tokio::io::copy(&mut reader, &mut sink)).await;
    Ok(())
}

/// Reads at most [`MAX_REQUEST_LINE`] bytes up to the first newline.
///
/// Returns `None` on EOF before any byte, or when no newline arrives within
/// the limit. Invalid UTF-8 is replaced rather than rejected.
async fn read_request_line<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = reader
        .take(MAX_REQUEST_LINE as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if read == MAX_REQUEST_LINE && !buf.ends_with(b"\n") {
        warn!("Request line exceeds {} bytes, closing connection", MAX_REQUEST_LINE);
        return Ok(None);
    }

    let line = String::from_utf8_lossy(&buf).into_owned();
    debug!("Request received: {}", line.trim_end());
    Ok(Some(line))
}
