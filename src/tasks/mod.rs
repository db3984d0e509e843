//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the proxy.
//!
//! # Tasks
//! - Reaper: sweeps expired cache entries at a fixed interval

mod reaper;

pub use reaper::{spawn_reaper, DEFAULT_REAPER_INTERVAL};
