//! Store subscription repository.

use sqlx::PgPool;

use foodloc_core::UserId;

use super::{RepositoryError, map_write_error};
use crate::models::interaction::Subscription;

pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Follow `store`, or unfollow it if already followed.
    ///
    /// Returns `true` when the user now follows the store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn toggle(&self, follower: UserId, store: UserId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM marketplace.subscriptions WHERE follower_id = $1 AND store_id = $2",
        )
        .bind(follower)
        .bind(store)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() > 0 {
            tx.commit().await?;
            return Ok(false);
        }

        sqlx::query(
            r"
            INSERT INTO marketplace.subscriptions (follower_id, store_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, store_id) DO NOTHING
            ",
        )
        .bind(follower)
        .bind(store)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "store"))?;

        tx.commit().await?;
        Ok(true)
    }

    /// Stores a user follows, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_follower(&self, follower: UserId) -> Result<Vec<Subscription>, RepositoryError> {
        let subs = sqlx::query_as::<_, Subscription>(
            r"
            SELECT id, follower_id, store_id, created_date FROM marketplace.subscriptions
            WHERE follower_id = $1
            ORDER BY created_date DESC, id DESC
            ",
        )
        .bind(follower)
        .fetch_all(self.pool)
        .await?;
        Ok(subs)
    }

    /// Followers of a store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_store(&self, store: UserId) -> Result<Vec<Subscription>, RepositoryError> {
        let subs = sqlx::query_as::<_, Subscription>(
            r"
            SELECT id, follower_id, store_id, created_date FROM marketplace.subscriptions
            WHERE store_id = $1
            ORDER BY created_date DESC, id DESC
            ",
        )
        .bind(store)
        .fetch_all(self.pool)
        .await?;
        Ok(subs)
    }
}
