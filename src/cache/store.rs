//! Cache Store Module
//!
//! Bounded page store combining an LRU map with a uniform TTL. Every operation
//! takes the internal lock for the duration of a single map touch, so callers
//! share the store through an `Arc` without any locking of their own.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CachedPage};

// == Cache Store ==
/// TTL-expiring page store with least-recently-used eviction.
///
/// Reads promote an entry to most recently used, so a full store drops the
/// entry that has gone longest without being read or written.
#[derive(Debug)]
pub struct CacheStore {
    /// Entries ordered by recency
    entries: Mutex<LruCache<String, CacheEntry>>,
    /// Lifetime applied to every entry
    ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries, each living `ttl`.
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    // == Get ==
    /// Returns a copy of the live value under `key`.
    ///
    /// An entry past its TTL is dropped here even if the sweep has not reached
    /// it yet, so both expiry paths agree at the read site.
    pub fn get(&self, key: &str) -> Option<CachedPage> {
        let mut entries = self.entries.lock();

        let expired = entries.peek(key)?.is_expired_at(Instant::now());
        if expired {
            entries.pop(key);
            debug!(key, "Expired entry dropped on read");
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores `value` under `key`, resetting its TTL.
    ///
    /// When the store is full the least recently used entry is evicted first.
    pub fn set(&self, key: impl Into<String>, value: CachedPage) {
        let key = key.into();
        let entry = CacheEntry::new(key.clone(), value, self.ttl);

        let displaced = self.entries.lock().push(key.clone(), entry);

        match displaced {
            Some((evicted, _)) if evicted != key => {
                debug!(key = %key, evicted = %evicted, "Cache full, evicted least recently used entry");
            }
            _ => debug!(key = %key, "Stored entry"),
        }
    }

    // == Flush All ==
    /// Removes every entry and returns how many were dropped.
    pub fn flush_all(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Flushes the store and runs `then` before the lock is released.
    ///
    /// No request can observe the emptied store before `then` has finished.
    pub fn flush_all_with<F: FnOnce()>(&self, then: F) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        then();
        count
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired_keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            entries.pop(key);
        }

        expired_keys.len()
    }

    // == Length ==
    /// Number of entries currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Lifetime applied to every entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Summed body size of all held entries.
    pub fn body_bytes(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .map(|(_, entry)| entry.value.size_bytes())
            .sum()
    }
}
