//! Upstream Fetcher
//!
//! Opens a fresh connection per call, writes a minimal GET request and reads
//! the response until the origin closes the stream.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{ProxyError, Result};

// == Fetcher Trait ==
/// Source of payloads for cache misses.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches the resource identified by `key`.
    ///
    /// Fails with [`ProxyError::NotFound`] when the origin has no such
    /// resource and [`ProxyError::Transport`] when it cannot be reached or read.
    async fn fetch(&self, key: &str) -> Result<Bytes>;
}

// == TCP Fetcher ==
/// Fetches from a fixed origin address over plain TCP.
#[derive(Debug, Clone)]
pub struct TcpFetcher {
    host: String,
    port: u16,
}

impl TcpFetcher {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Builds the request line and headers sent for `key`.
    fn request_for(&self, key: &str) -> String {
        format!(
            "GET /{} HTTP/1.1\r\nHost: {}\r\nUser-Agent: cache-proxy/{}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
            key,
            self.host,
            env!("CARGO_PKG_VERSION")
        )
    }
}

#[async_trait]
impl Fetcher for TcpFetcher {
    // TODO: bound connect and read with a configurable timeout; a silent origin
    // currently holds the calling task until the peer closes the stream.
    async fn fetch(&self, key: &str) -> Result<Bytes> {
        let addr = (self.host.as_str(), self.port);
        let mut stream = TcpStream::connect(addr).await.map_err(|e| {
            ProxyError::Transport(format!("connect {}:{}: {}", self.host, self.port, e))
        })?;

        stream
            .write_all(self.request_for(key).as_bytes())
            .await
            .map_err(|e| ProxyError::Transport(format!("write request for '{}': {}", key, e)))?;
        stream
            .flush()
            .await
            .map_err(|e| ProxyError::Transport(format!("write request for '{}': {}", key, e)))?;

        let mut body = Vec::new();
        stream
            .read_to_end(&mut body)
            .await
            .map_err(|e| ProxyError::Transport(format!("read response for '{}': {}", key, e)))?;

        debug!("Fetched {} bytes for '{}' from upstream", body.len(), key);
        classify_response(key, body)
    }
}

// == Response Classification ==
/// Turns a complete upstream response into a payload or a not-found error.
///
/// An empty stream or a `404` status line means the origin has no such
/// resource; anything else is returned verbatim.
pub fn classify_response(key: &str, body: Vec<u8>) -> Result<Bytes> {
    if body.is_empty() || is_not_found_status(&body) {
        return Err(ProxyError::NotFound(key.to_string()));
    }
    Ok(Bytes::from(body))
}

fn is_not_found_status(body: &[u8]) -> bool {
    let status_line = body.split(|&b| b == b'\n').next().unwrap_or_default();
    let mut parts = status_line.split(|&b| b == b' ');
    matches!(
        (parts.next(), parts.next()),
        (Some(version), Some(b"404")) if version.starts_with(b"HTTP/")
    )
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    #[test]
    fn test_request_format() {
        let fetcher = TcpFetcher::new("origin.local", 8000);
        let request = fetcher.request_for("docs/a.txt");

        assert!(request.starts_with("GET /docs/a.txt HTTP/1.1\r\n"));
        assert!(request.contains("Host: origin.local\r\n"));
        assert!(request.contains("Connection: close\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_classify_empty_is_not_found() {
        let result = classify_response("a.txt", Vec::new());
        assert!(matches!(result, Err(ProxyError::NotFound(key)) if key == "a.txt"));
    }

    #[test]
    fn test_classify_404_status_is_not_found() {
        let body = b"HTTP/1.1 404 Not Found\r\n\r\nnope".to_vec();
        assert!(matches!(
            classify_response("a.txt", body),
            Err(ProxyError::NotFound(_))
        ));
    }

    #[test]
    fn test_classify_passes_other_bytes_verbatim() {
        let ok = b"HTTP/1.1 200 OK\r\n\r\nhello".to_vec();
        assert_eq!(classify_response("a", ok.clone()).unwrap().as_ref(), &ok[..]);

        let raw = b"404 is just text here".to_vec();
        assert_eq!(classify_response("a", raw.clone()).unwrap().as_ref(), &raw[..]);
    }

    #[tokio::test]
    async fn test_fetch_reads_until_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let origin = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(socket);
            let mut request_line = String::new();
            reader.read_line(&mut request_line).await.unwrap();
            let mut header = String::new();
            while reader.read_line(&mut header).await.unwrap() > 0 && header != "\r\n" {
                header.clear();
            }
            reader.get_mut().write_all(b"0123456789").await.unwrap();
            request_line
        });

        let fetcher = TcpFetcher::new("127.0.0.1", port);
        let payload = fetcher.fetch("a.txt").await.unwrap();

        assert_eq!(payload.as_ref(), b"0123456789");
        assert_eq!(origin.await.unwrap(), "GET /a.txt HTTP/1.1\r\n");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpFetcher::new("127.0.0.1", port).fetch("a.txt").await;
        assert!(matches!(result, Err(ProxyError::Transport(_))));
    }
}
