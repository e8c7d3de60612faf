//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `5000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `APP_ENV`: environment name reported by `/api/health` (default: `"development"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset selects the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `ORDER_TIMEOUT_SECS`: order placement deadline (default: `10`)
/// - `CORS_ORIGIN`: allowed origin; unset allows any
/// - `SEED_CATALOG`: `true` to load the demo catalog into an empty store
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub environment: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub order_timeout: Duration,
    pub cors_origin: Option<String>,
    pub seed_catalog: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: non_empty("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
            environment: non_empty("APP_ENV").unwrap_or(defaults.environment),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: non_empty("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.database_max_connections),
            order_timeout: non_empty("ORDER_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.order_timeout),
            cors_origin: non_empty("CORS_ORIGIN"),
            seed_catalog: non_empty("SEED_CATALOG")
                .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            environment: "development".to_string(),
            database_url: None,
            database_max_connections: 10,
            order_timeout: services::DEFAULT_ORDER_TIMEOUT,
            cors_origin: None,
            seed_catalog: false,
        }
    }
}
