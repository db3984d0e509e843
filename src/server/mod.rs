//! Proxy Server Module
//!
//! Plain TCP front end: one `GET /<key>` line per connection, answered with
//! the raw payload or a short error response.

mod listener;
mod request;

pub use listener::{handle_connection, serve, MAX_REQUEST_LINE};
pub use request::{parse_request_line, BAD_GATEWAY_RESPONSE, NOT_FOUND_RESPONSE};
