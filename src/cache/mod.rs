//! Cache Module
//!
//! In-memory page cache: the TTL/LRU store, key derivation, per-route cache
//! policies and hit/miss statistics.

mod entry;
mod key;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, CachedPage, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE};
pub use key::{CacheKey, PAGE_NAMESPACE};
pub use policy::{
    path_of, BypassRules, CachePolicy, PathPattern, PolicyRule, PolicyTable,
    STALE_WHILE_REVALIDATE_SECS,
};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
