//! Cache key derivation.

use std::fmt;

/// Namespace every page key lives under.
pub const PAGE_NAMESPACE: &str = "page";

// == Cache Key ==
/// Key identifying one cacheable response.
///
/// Built from the original request URL (path plus query) so a lookup and the
/// store that follows a miss always agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for an original URL such as `/products/1?tab=specs`.
    pub fn for_url(original_url: &str) -> Self {
        Self(format!("{PAGE_NAMESPACE}:{original_url}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // == Key Derivation ==

    #[test]
    fn test_key_is_namespaced() {
        assert_eq!(CacheKey::for_url("/").as_str(), "page:/");
        assert_eq!(
            CacheKey::for_url("/products/7?tab=specs").to_string(),
            "page:/products/7?tab=specs"
        );
    }

    #[test]
    fn test_key_is_deterministic() {
        assert_eq!(CacheKey::for_url("/about"), CacheKey::for_url("/about"));
    }

    #[test]
    fn test_query_string_is_part_of_the_key() {
        assert_ne!(CacheKey::for_url("/search?q=a"), CacheKey::for_url("/search?q=b"));
        assert_ne!(CacheKey::for_url("/search"), CacheKey::for_url("/search?q=a"));
    }
}
