//! Cache Entry Module
//!
//! Defines the cached page payload and the entry wrapper that carries its TTL.

use std::time::{Duration, Instant};

/// Content type used for rendered pages when the renderer does not supply one.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Content type used for the transformed document endpoint.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// == Cached Page ==
/// A stored response body together with the content type it was served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    /// Value of the `Content-Type` header to replay on a hit
    pub content_type: String,
    /// Response body, verbatim
    pub body: String,
}

impl CachedPage {
    pub fn new(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// A page served as `text/html`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(HTML_CONTENT_TYPE, body)
    }

    /// A body served as `application/json`.
    pub fn json(body: impl Into<String>) -> Self {
        Self::new(JSON_CONTENT_TYPE, body)
    }

    /// Size of the body in bytes.
    pub fn size_bytes(&self) -> usize {
        self.body.len()
    }
}

// == Cache Entry ==
/// A single entry owned by the store.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Key the entry was stored under
    pub key: String,
    /// The cached payload
    pub value: CachedPage,
    /// Moment the entry was written
    pub stored_at: Instant,
    /// Lifetime of the entry, fixed by the store
    pub ttl: Duration,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current instant.
    pub fn new(key: impl Into<String>, value: CachedPage, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks expiry against an explicit instant.
    ///
    /// An entry is expired once `now - stored_at >= ttl`, so a zero TTL entry is
    /// expired immediately.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.ttl
    }

    /// Checks expiry against the current instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> CachedPage {
        CachedPage::html("<h1>hello</h1>")
    }

    #[test]
    fn test_cached_page_content_types() {
        assert_eq!(CachedPage::html("x").content_type, HTML_CONTENT_TYPE);
        assert_eq!(CachedPage::json("{}").content_type, JSON_CONTENT_TYPE);
        assert_eq!(CachedPage::html("abcd").size_bytes(), 4);
    }

    #[test]
    fn test_entry_fresh_is_not_expired() {
        let entry = CacheEntry::new("page:/", page(), Duration::from_secs(60));

        assert_eq!(entry.key, "page:/");
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new("page:/", page(), Duration::from_secs(10));
        let later = entry.stored_at + Duration::from_secs(10) + Duration::from_millis(1);

        assert!(entry.is_expired_at(later));
        assert!(!entry.is_expired_at(entry.stored_at + Duration::from_secs(9)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("page:/", page(), Duration::from_secs(5));

        // Exactly at stored_at + ttl the entry is already stale
        assert!(entry.is_expired_at(entry.stored_at + Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new("page:/", page(), Duration::ZERO);
        assert!(entry.is_expired());
    }
}
