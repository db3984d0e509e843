//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{timestamp_to_utc, EntrySummary};
use crate::service::{CacheReport, Outcome};

/// One entry in the `GET /cache` listing
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub key: String,
    /// Payload size in bytes
    pub size: u64,
    /// Insertion or last refresh time, RFC 3339
    pub stored_at: String,
    pub fresh: bool,
}

impl From<EntrySummary> for EntryResponse {
    fn from(summary: EntrySummary) -> Self {
        Self {
            stored_at: timestamp_to_utc(summary.stored_at).to_rfc3339(),
            key: summary.key,
            size: summary.size,
            fresh: summary.fresh,
        }
    }
}

/// Response body for `GET /cache`
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub entries: Vec<EntryResponse>,
}

impl SnapshotResponse {
    pub fn new(entries: Vec<EntrySummary>) -> Self {
        Self {
            entries: entries.into_iter().map(EntryResponse::from).collect(),
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Number of entries dropped
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Cache cleared ({} entries removed)", removed),
            removed,
        }
    }
}

/// Response body for `DELETE /cache/*key`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    pub message: String,
    pub key: String,
}

impl RemoveResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed from cache", key),
            key,
        }
    }
}

/// Response body for the expiration endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ExpirationResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub ttl_ms: u64,
}

impl ExpirationResponse {
    pub fn global(ttl_ms: u64) -> Self {
        Self {
            message: format!("Global expiration set to {} ms", ttl_ms),
            key: None,
            ttl_ms,
        }
    }

    pub fn restarted(key: impl Into<String>, ttl_ms: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Expiration window for '{}' restarted", key),
            key: Some(key),
            ttl_ms,
        }
    }
}

/// Response body for `POST /run/*key`
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub key: String,
    /// Size of the resolved payload in bytes
    pub size: usize,
    pub outcome: Outcome,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub report: CacheReport,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheReport> for StatsResponse {
    fn from(report: CacheReport) -> Self {
        Self {
            hit_rate: report.stats.hit_rate(),
            report,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
