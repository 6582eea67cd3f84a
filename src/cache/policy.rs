//! Cache duration policies and the bypass decision.
//!
//! A [`PolicyTable`] maps a request path to the browser and edge lifetimes sent
//! back in `Cache-Control`. Rules are tried in order and the first match wins;
//! the table's default covers every path no rule claims.

use axum::http::Method;

/// `stale-while-revalidate` window added to every cacheable response, in seconds.
pub const STALE_WHILE_REVALIDATE_SECS: u64 = 86_400;

// == Cache Policy ==
/// Browser and edge lifetimes for one class of responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// `max-age` in seconds
    pub browser_max_age: u64,
    /// `s-maxage` and CDN `max-age` in seconds
    pub edge_max_age: u64,
}

impl CachePolicy {
    pub const fn new(browser_max_age: u64, edge_max_age: u64) -> Self {
        Self {
            browser_max_age,
            edge_max_age,
        }
    }

    /// Value of the `Cache-Control` header.
    pub fn cache_control(&self) -> String {
        format!(
            "public, max-age={}, s-maxage={}, stale-while-revalidate={}",
            self.browser_max_age, self.edge_max_age, STALE_WHILE_REVALIDATE_SECS
        )
    }

    /// Value of the `CDN-Cache-Control` header read by the edge.
    pub fn cdn_cache_control(&self) -> String {
        format!("max-age={}", self.edge_max_age)
    }
}

// == Policy Table ==
/// Matches a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// The path equals the given string
    Exact(String),
    /// The path starts with the given string
    Prefix(String),
}

impl PathPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => path == expected,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// One `pattern -> policy` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub pattern: PathPattern,
    pub policy: CachePolicy,
}

impl PolicyRule {
    pub fn new(pattern: PathPattern, policy: CachePolicy) -> Self {
        Self { pattern, policy }
    }
}

/// Ordered rule list with a fallback policy.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
    fallback: CachePolicy,
}

impl PolicyTable {
    /// Applied when no rule matches.
    pub const DEFAULT_POLICY: CachePolicy = CachePolicy::new(300, 1800);

    pub fn new(rules: Vec<PolicyRule>, fallback: CachePolicy) -> Self {
        Self { rules, fallback }
    }

    /// Resolves the policy for an original URL. Any query string is ignored.
    pub fn resolve(&self, original_url: &str) -> CachePolicy {
        let path = path_of(original_url);
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| rule.policy)
            .unwrap_or(self.fallback)
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn fallback(&self) -> CachePolicy {
        self.fallback
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        let landing = CachePolicy::new(300, 3600);
        let articles = CachePolicy::new(600, 7200);
        let products = CachePolicy::new(300, 1800);
        let personal = CachePolicy::new(60, 300);

        let rules = vec![
            PolicyRule::new(PathPattern::exact("/"), landing),
            PolicyRule::new(PathPattern::prefix("/about"), landing),
            PolicyRule::new(PathPattern::prefix("/contact"), landing),
            PolicyRule::new(PathPattern::prefix("/pricing"), landing),
            PolicyRule::new(PathPattern::prefix("/api/test/"), articles),
            PolicyRule::new(PathPattern::prefix("/products/"), products),
            PolicyRule::new(PathPattern::prefix("/dashboard"), personal),
            PolicyRule::new(PathPattern::prefix("/profile"), personal),
            PolicyRule::new(PathPattern::prefix("/account"), personal),
        ];

        Self::new(rules, Self::DEFAULT_POLICY)
    }
}

// == Bypass Rules ==
/// Decides which requests skip the cache entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassRules {
    excluded_prefixes: Vec<String>,
}

impl BypassRules {
    /// `prefixes` are path segments such as `/api`; each excludes itself and
    /// everything beneath it.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_prefixes: prefixes
                .into_iter()
                .map(|prefix| {
                    let prefix: String = prefix.into();
                    prefix.trim_end_matches('/').to_string()
                })
                .collect(),
        }
    }

    /// True for anything but `GET`, and for paths under an excluded prefix.
    pub fn should_bypass(&self, method: &Method, path: &str) -> bool {
        *method != Method::GET || self.is_excluded(path)
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl Default for BypassRules {
    fn default() -> Self {
        Self::new(["/api", "/auth"])
    }
}

/// Path component of an original URL.
pub fn path_of(original_url: &str) -> &str {
    original_url
        .split_once('?')
        .map_or(original_url, |(path, _)| path)
}
