//! Payment method repository.

use sqlx::PgPool;

use foodloc_core::PaymentMethodId;

use super::{RepositoryError, map_write_error};
use crate::models::catalog::PaymentMethod;

pub struct PaymentMethodRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentMethodRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Payment methods, optionally including disabled ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<PaymentMethod>, RepositoryError> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            "SELECT id, name, active FROM marketplace.payment_methods WHERE $1 OR active ORDER BY id",
        )
        .bind(include_inactive)
        .fetch_all(self.pool)
        .await?;
        Ok(methods)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentMethodId) -> Result<Option<PaymentMethod>, RepositoryError> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            "SELECT id, name, active FROM marketplace.payment_methods WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(method)
    }

    /// Create a payment method, or return the existing one with this name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, name: &str, active: bool) -> Result<PaymentMethod, RepositoryError> {
        sqlx::query_as::<_, PaymentMethod>(
            r"
            INSERT INTO marketplace.payment_methods (name, active) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET active = EXCLUDED.active
            RETURNING id, name, active
            ",
        )
        .bind(name)
        .bind(active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "payment method"))
    }

    /// Enable or disable a payment method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn set_active(&self, id: PaymentMethodId, active: bool) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE marketplace.payment_methods SET active = $2 WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
