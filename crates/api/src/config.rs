//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOODLOC_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `FOODLOC_HOST` - Bind address (default: 127.0.0.1)
//! - `FOODLOC_PORT` - Listen port (default: 8000)
//! - `FOODLOC_BASE_URL` - Public URL used in pagination links (default: `http://localhost:8000`)
//! - `FOODLOC_MEDIA_BASE_URL` - Prefix joined with stored image keys (default: empty)
//! - `FOODLOC_UTC_OFFSET_MINUTES` - Local time zone of the marketplace, used for
//!   dish service windows (default: 0)
//! - `FOODLOC_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Largest accepted UTC offset, in minutes (UTC+14:00).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Sentry error tracking settings shared by the API and admin binaries.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL, used to build absolute pagination links
    pub base_url: Url,
    /// Prefix for image keys in responses
    pub media_base_url: String,
    /// Local time zone of the marketplace
    pub utc_offset: FixedOffset,
    pub log_format: LogFormat,
    pub sentry: SentryConfig,
}

impl ApiConfig {
    /// Configuration with every optional setting at its default.
    ///
    /// # Panics
    ///
    /// Never: the default base URL is a valid literal.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_defaults(database_url: SecretString) -> Self {
        Self {
            database_url,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            base_url: Url::parse("http://localhost:8000").expect("valid default base URL"),
            media_base_url: String::new(),
            utc_offset: Utc.fix(),
            log_format: LogFormat::Text,
            sentry: SentryConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FOODLOC_DATABASE_URL")?;
        let host = parse_env("FOODLOC_HOST", "127.0.0.1")?;
        let port = parse_env("FOODLOC_PORT", "8000")?;
        let base_url = parse_base_url("FOODLOC_BASE_URL", "http://localhost:8000")?;
        let media_base_url = get_env_or_default("FOODLOC_MEDIA_BASE_URL", "");
        let utc_offset = parse_utc_offset("FOODLOC_UTC_OFFSET_MINUTES")?;
        let log_format = parse_log_format("FOODLOC_LOG_FORMAT")?;
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            media_base_url,
            utc_offset,
            log_format,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl SentryConfig {
    /// Load Sentry settings from `SENTRY_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparsable or out-of-range rates.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_rate("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if the variable is unset.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` if neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable (empty counts as unset).
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an absolute http(s) base URL.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for relative or non-http URLs.
pub fn parse_base_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = get_env_or_default(key, default);
    validate_base_url(key, &raw)
}

fn validate_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Parse the marketplace time zone offset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for non-integers or offsets beyond ±14h.
pub fn parse_utc_offset(key: &str) -> Result<FixedOffset, ConfigError> {
    let minutes: i32 = parse_env(key, "0")?;
    offset_from_minutes(minutes).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("{minutes} minutes is out of range"))
    })
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return None;
    }
    FixedOffset::east_opt(minutes * 60)
}

/// Parse `text`/`json` log format.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for any other value.
pub fn parse_log_format(key: &str) -> Result<LogFormat, ConfigError> {
    match get_env_or_default(key, "text").to_ascii_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected 'text' or 'json', got '{other}'"),
        )),
    }
}

fn parse_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate: f32 = parse_env(key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::with_defaults(SecretString::from("postgres://localhost/test"));
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8000);
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert!(!config.is_https());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config =
            ApiConfig::with_defaults(SecretString::from("postgres://app:hunter2@db/foodloc"));
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_offset_from_minutes() {
        assert_eq!(
            offset_from_minutes(420).unwrap().local_minus_utc(),
            7 * 3600
        );
        assert_eq!(
            offset_from_minutes(-300).unwrap().local_minus_utc(),
            -5 * 3600
        );
        assert!(offset_from_minutes(15 * 60).is_none());
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("K", "https://api.foodlocation.vn").is_ok());
        assert!(validate_base_url("K", "ftp://files.foodlocation.vn").is_err());
        assert!(validate_base_url("K", "/relative").is_err());
    }

    #[test]
    fn test_https_detection() {
        let mut config = ApiConfig::with_defaults(SecretString::from("postgres://x"));
        config.base_url = Url::parse("https://api.foodlocation.vn").unwrap();
        assert!(config.is_https());
    }

    #[test]
    fn test_sentry_defaults() {
        let sentry = SentryConfig::default();
        assert!(sentry.dsn.is_none());
        assert!((sentry.sample_rate - 1.0).abs() < f32::EPSILON);
        assert!(sentry.traces_sample_rate.abs() < f32::EPSILON);
    }
}
