//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines with timestamps
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds applied to every cached page
    pub cache_ttl: u64,
    /// Background sweep interval in seconds
    pub check_period: u64,
    /// Maximum number of pages the cache can hold
    pub max_entries: usize,
    /// Directory served as static assets
    pub static_dir: PathBuf,
    /// Markdown document behind the data endpoint
    pub document_path: PathBuf,
    /// Base URL of the SSR backend
    pub render_upstream: String,
    /// Upstream render timeout in seconds
    pub render_timeout: u64,
    /// Bearer token guarding cache-clear, open when unset
    pub admin_token: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 4000)
    /// - `CACHE_TTL` - Page TTL in seconds (default: 300)
    /// - `CACHE_CHECK_PERIOD` - Sweep frequency in seconds (default: 60, min: 1)
    /// - `CACHE_MAX_KEYS` - Maximum cached pages (default: 1000, min: 1)
    /// - `STATIC_DIR` - Static asset directory (default: `dist/browser`)
    /// - `DOCUMENT_PATH` - Data endpoint document (default: `dist/browser/assets/dummy.md`)
    /// - `RENDER_UPSTREAM` - SSR backend (default: `http://127.0.0.1:4200`)
    /// - `RENDER_TIMEOUT` - Render timeout in seconds (default: 30)
    /// - `ADMIN_TOKEN` - Cache-clear bearer token (default: unset)
    /// - `LOG_FORMAT` - `pretty` or `json` (default: `pretty`)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            server_port: parsed(&lookup, "PORT").unwrap_or(defaults.server_port),
            cache_ttl: parsed(&lookup, "CACHE_TTL").unwrap_or(defaults.cache_ttl),
            check_period: parsed(&lookup, "CACHE_CHECK_PERIOD")
                .unwrap_or(defaults.check_period)
                .max(1),
            max_entries: parsed(&lookup, "CACHE_MAX_KEYS")
                .unwrap_or(defaults.max_entries)
                .max(1),
            static_dir: text("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            document_path: text("DOCUMENT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.document_path),
            render_upstream: text("RENDER_UPSTREAM").unwrap_or(defaults.render_upstream),
            render_timeout: parsed(&lookup, "RENDER_TIMEOUT").unwrap_or(defaults.render_timeout),
            admin_token: text("ADMIN_TOKEN"),
            log_format: parsed(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.check_period)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout)
    }
}

fn parsed<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 4000,
            cache_ttl: 300,
            check_period: 60,
            max_entries: 1000,
            static_dir: PathBuf::from("dist/browser"),
            document_path: PathBuf::from("dist/browser/assets/dummy.md"),
            render_upstream: "http://127.0.0.1:4200".to_string(),
            render_timeout: 30,
            admin_token: None,
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.check_period, 60);
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.static_dir, PathBuf::from("dist/browser"));
        assert_eq!(config.render_upstream, "http://127.0.0.1:4200");
        assert!(config.admin_token.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_source_yields_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.ttl(), Duration::from_secs(300));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.render_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("CACHE_TTL", "10"),
            ("CACHE_CHECK_PERIOD", "5"),
            ("CACHE_MAX_KEYS", "20"),
            ("STATIC_DIR", "/srv/public"),
            ("DOCUMENT_PATH", "/srv/doc.md"),
            ("RENDER_UPSTREAM", "http://ssr:4200"),
            ("RENDER_TIMEOUT", "3"),
            ("ADMIN_TOKEN", "s3cret"),
            ("LOG_FORMAT", "JSON"),
        ]);

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cache_ttl, 10);
        assert_eq!(config.check_period, 5);
        assert_eq!(config.max_entries, 20);
        assert_eq!(config.static_dir, PathBuf::from("/srv/public"));
        assert_eq!(config.document_path, PathBuf::from("/srv/doc.md"));
        assert_eq!(config.render_upstream, "http://ssr:4200");
        assert_eq!(config.render_timeout, 3);
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("CACHE_TTL", "-1"),
            ("LOG_FORMAT", "xml"),
            ("ADMIN_TOKEN", "  "),
        ]);

        assert_eq!(config.server_port, 4000);
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_zero_limits_are_clamped() {
        let config = config_from(&[("CACHE_CHECK_PERIOD", "0"), ("CACHE_MAX_KEYS", "0")]);
        assert_eq!(config.check_period, 1);
        assert_eq!(config.max_entries, 1);
    }
}
