//! Upstream Module
//!
//! One-shot fetches of a resource from the configured origin.

mod fetcher;

pub use fetcher::{classify_response, Fetcher, TcpFetcher};
