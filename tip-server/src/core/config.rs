use std::time::Duration;

use crate::utils::time::parse_timezone;

/// Server configuration
///
/// # Environment variables
///
/// Every value can be overridden from the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | tracing filter directive |
/// | LOG_DIR | (unset) | rolling log directory |
/// | TIMEZONE | UTC | business time zone for day keys |
/// | STATS_CACHE_TTL_SECS | 30 | statistics snapshot cache lifetime |
/// | SETTLEMENT_TIMEOUT_MS | 10000 | settlement gateway timeout |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP request timeout |
/// | DEFAULT_PER_PAGE | 20 | history page size when none is given |
///
/// # Example
///
/// ```ignore
/// TIMEZONE=Europe/Madrid HTTP_PORT=8080 cargo run -p tip-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// IANA name, e.g. `Europe/Madrid`
    pub timezone: String,
    pub stats_cache_ttl_secs: u64,
    pub settlement_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub default_per_page: u32,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            timezone: std::env::var("TIMEZONE").unwrap_or_else(|_| "UTC".into()),
            stats_cache_ttl_secs: env_or("STATS_CACHE_TTL_SECS", 30),
            settlement_timeout_ms: env_or("SETTLEMENT_TIMEOUT_MS", 10_000),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            default_per_page: env_or("DEFAULT_PER_PAGE", 20),
        }
    }

    /// Override the values tests care about
    pub fn with_overrides(
        http_port: u16,
        timezone: impl Into<String>,
        stats_cache_ttl_secs: u64,
    ) -> Self {
        let mut config = Self::from_env();
        config.http_port = http_port;
        config.timezone = timezone.into();
        config.stats_cache_ttl_secs = stats_cache_ttl_secs;
        config
    }

    /// Business time zone, UTC when the name is unknown
    pub fn tz(&self) -> chrono_tz::Tz {
        parse_timezone(&self.timezone).unwrap_or_else(|e| {
            tracing::warn!(timezone = %self.timezone, error = %e, "Falling back to UTC");
            chrono_tz::UTC
        })
    }

    pub fn stats_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_cache_ttl_secs)
    }

    pub fn settlement_timeout(&self) -> Duration {
        Duration::from_millis(self.settlement_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides() {
        let config = Config::with_overrides(4000, "Europe/Madrid", 5);
        assert_eq!(config.http_port, 4000);
        assert_eq!(config.tz(), chrono_tz::Europe::Madrid);
        assert_eq!(config.stats_cache_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let config = Config::with_overrides(4000, "Nowhere/Special", 5);
        assert_eq!(config.tz(), chrono_tz::UTC);
    }
}
