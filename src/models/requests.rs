//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

/// Request body for `PUT /expiration` and `PUT /expiration/*key`
#[derive(Debug, Clone, Deserialize)]
pub struct ExpirationRequest {
    /// Expiration in milliseconds
    pub ttl_ms: u64,
}

impl ExpirationRequest {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}
