//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use sqlx::PgPool;

use crate::cache::ReferenceCache;
use crate::config::ApiConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    cache: ReferenceCache,
}

impl AppState {
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cache: ReferenceCache::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Tags and payment methods.
    #[must_use]
    pub fn cache(&self) -> &ReferenceCache {
        &self.inner.cache
    }

    /// Prefix joined with stored image keys.
    #[must_use]
    pub fn media(&self) -> &str {
        &self.inner.config.media_base_url
    }

    /// Current wall-clock time in the marketplace's time zone.
    #[must_use]
    pub fn local_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.inner.config.utc_offset)
    }

    /// Time of day used to check dish service windows.
    #[must_use]
    pub fn local_time(&self) -> NaiveTime {
        self.local_now().time()
    }

    /// Offset of the marketplace's time zone from UTC, in minutes.
    #[must_use]
    pub fn utc_offset_minutes(&self) -> i32 {
        self.inner.config.utc_offset.local_minus_utc() / 60
    }
}
