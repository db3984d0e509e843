//! Request-line parsing.

/// Response written when the origin has no such resource.
pub const NOT_FOUND_RESPONSE: &[u8] = b"HTTP/1.1 404 Not Found\r\n\r\nError 404: file not found.";

/// Response written when the origin cannot be reached or read.
pub const BAD_GATEWAY_RESPONSE: &[u8] =
    b"HTTP/1.1 502 Bad Gateway\r\n\r\nError 502: upstream unavailable.";

/// Extracts the cache key from a `GET /<key> ...` line.
///
/// Returns `None` for anything that is not a GET with a target.
pub fn parse_request_line(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    Some(target.strip_prefix('/').unwrap_or(target).to_string())
}
