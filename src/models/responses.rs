//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Process memory figures reported by the stats endpoint.
///
/// Process figures are `null` where the platform does not expose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Resident set size
    pub rss_bytes: Option<u64>,
    /// Peak resident set size
    pub peak_rss_bytes: Option<u64>,
    /// Summed body size of cached pages
    pub cache_bytes: u64,
}

/// Response body for GET /api/cache-stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of render attempts
    pub renders: u64,
    /// Percentage string such as `"75.00%"`, or `"0%"` before any lookup
    pub hit_rate: String,
    /// Current number of entries in cache
    pub cache_size: usize,
    pub memory_usage: MemoryUsage,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a counter snapshot
    pub fn new(stats: StatsSnapshot, cache_size: usize, memory_usage: MemoryUsage) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            renders: stats.renders,
            hit_rate: stats.hit_rate_label(),
            cache_size,
            memory_usage,
        }
    }
}

/// Response body for POST /api/cache-clear
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
    /// Number of entries dropped
    pub flushed: usize,
    pub cleared_at: DateTime<Utc>,
}

impl ClearResponse {
    pub fn cleared(flushed: usize) -> Self {
        Self {
            success: true,
            message: "Cache cleared".to_string(),
            flushed,
            cleared_at: Utc::now(),
        }
    }
}

/// Response body for GET /api/test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentResponse {
    /// Transformed document
    pub html: String,
}
