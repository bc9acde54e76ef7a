//! In-memory cache for reference data.
//!
//! Tags and payment methods are read on almost every catalog and checkout
//! page and change rarely. Entries live for five minutes and are invalidated
//! by the handlers that write them.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::db::{PaymentMethodRepository, RepositoryError, TagRepository};
use crate::models::catalog::{PaymentMethod, Tag};

/// Cache key for reference data.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Tags,
    ActivePaymentMethods,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Tags(Arc<Vec<Tag>>),
    PaymentMethods(Arc<Vec<PaymentMethod>>),
}

#[derive(Clone)]
pub struct ReferenceCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(300))
                .build(),
        }
    }

    /// All tags, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn tags(&self, pool: &PgPool) -> Result<Arc<Vec<Tag>>, RepositoryError> {
        if let Some(CacheValue::Tags(tags)) = self.cache.get(&CacheKey::Tags).await {
            return Ok(tags);
        }
        let tags = Arc::new(TagRepository::new(pool).list().await?);
        self.cache
            .insert(CacheKey::Tags, CacheValue::Tags(Arc::clone(&tags)))
            .await;
        Ok(tags)
    }

    /// Active payment methods, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn payment_methods(
        &self,
        pool: &PgPool,
    ) -> Result<Arc<Vec<PaymentMethod>>, RepositoryError> {
        if let Some(CacheValue::PaymentMethods(methods)) =
            self.cache.get(&CacheKey::ActivePaymentMethods).await
        {
            return Ok(methods);
        }
        let methods = Arc::new(PaymentMethodRepository::new(pool).list(false).await?);
        self.cache
            .insert(
                CacheKey::ActivePaymentMethods,
                CacheValue::PaymentMethods(Arc::clone(&methods)),
            )
            .await;
        Ok(methods)
    }

    pub async fn invalidate(&self, key: CacheKey) {
        self.cache.invalidate(&key).await;
    }
}

#[cfg(test)]
mod tests {
    use foodloc_core::TagId;

    use super::*;

    #[tokio::test]
    async fn test_invalidate_drops_entry() {
        let cache = ReferenceCache::new();
        let tags = Arc::new(vec![Tag {
            id: TagId::new(1),
            name: "vegan".to_string(),
        }]);
        cache
            .cache
            .insert(CacheKey::Tags, CacheValue::Tags(tags))
            .await;
        assert!(cache.cache.get(&CacheKey::Tags).await.is_some());

        cache.invalidate(CacheKey::Tags).await;
        assert!(cache.cache.get(&CacheKey::Tags).await.is_none());
    }
}
