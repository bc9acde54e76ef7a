//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOODLOC_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `FOODLOC_ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `FOODLOC_ADMIN_PORT` - Listen port (default: 8001)
//! - `FOODLOC_ADMIN_BASE_URL` - Public URL of the console (default: `http://localhost:8001`)
//! - `FOODLOC_MEDIA_BASE_URL` - Prefix joined with stored image keys (default: empty)
//! - `FOODLOC_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_*` - Same variables as the API

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use foodloc_api::config::{
    ConfigError, LogFormat, SentryConfig, get_database_url, get_env_or_default, parse_base_url,
    parse_env, parse_log_format,
};
use secrecy::SecretString;
use url::Url;

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL of the console
    pub base_url: Url,
    /// Prefix for image keys (avatars)
    pub media_base_url: String,
    pub log_format: LogFormat,
    pub sentry: SentryConfig,
}

impl AdminConfig {
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
            port: 8001,
            base_url: Url::parse("http://localhost:8001").expect("valid default base URL"),
            media_base_url: String::new(),
            log_format: LogFormat::Text,
            sentry: SentryConfig::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("FOODLOC_DATABASE_URL")?,
            host: parse_env("FOODLOC_ADMIN_HOST", "127.0.0.1")?,
            port: parse_env("FOODLOC_ADMIN_PORT", "8001")?,
            base_url: parse_base_url("FOODLOC_ADMIN_BASE_URL", "http://localhost:8001")?,
            media_base_url: get_env_or_default("FOODLOC_MEDIA_BASE_URL", ""),
            log_format: parse_log_format("FOODLOC_LOG_FORMAT")?,
            sentry: SentryConfig::from_env()?,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdminConfig::with_defaults(SecretString::from("postgres://localhost/test"));
        assert_eq!(config.socket_addr().port(), 8001);
        assert!(config.socket_addr().ip().is_loopback());
        assert!(!config.is_https());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config =
            AdminConfig::with_defaults(SecretString::from("postgres://staff:s3cr3t@db/foodloc"));
        assert!(!format!("{config:?}").contains("s3cr3t"));
    }
}
