//! Process Memory Sampling
//!
//! Reads resident and peak resident set size from `/proc/self/status`. On
//! platforms without procfs both figures are reported as unknown.

use crate::cache::CacheStore;
use crate::models::MemoryUsage;

const PROC_STATUS: &str = "/proc/self/status";

/// Samples process memory and the cache's share of it.
pub fn sample(store: &CacheStore) -> MemoryUsage {
    let status = std::fs::read_to_string(PROC_STATUS).ok();
    let field = |name: &str| status.as_deref().and_then(|s| status_field_bytes(s, name));

    MemoryUsage {
        rss_bytes: field("VmRSS"),
        peak_rss_bytes: field("VmHWM"),
        cache_bytes: store.body_bytes() as u64,
    }
}

/// Parses a `Name:   1234 kB` line into bytes.
fn status_field_bytes(status: &str, name: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let rest = line.strip_prefix(name)?.strip_prefix(':')?;
        let mut parts = rest.split_whitespace();
        let value: u64 = parts.next()?.parse().ok()?;
        let multiplier = match parts.next() {
            Some("kB") => 1024,
            Some("mB") => 1024 * 1024,
            Some("gB") => 1024 * 1024 * 1024,
            None => 1,
            Some(_) => return None,
        };
        Some(value * multiplier)
    })
}
