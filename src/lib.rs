//! Cache Proxy - A forward caching proxy
//!
//! Serves `GET /<key>` requests from a size-bounded in-memory cache with
//! global TTL expiration, fetching misses from a single upstream origin.

pub mod api;
pub mod cache;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod server;
pub mod service;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use cache::{CacheStore, SharedStore};
pub use config::Config;
pub use error::{ProxyError, Result};
pub use service::{Outcome, Resolution, ResolutionService};
pub use tasks::spawn_reaper;
pub use upstream::{Fetcher, TcpFetcher};
