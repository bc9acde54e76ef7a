//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! # Schema: `marketplace`
//!
//! ## Tables
//!
//! - `users` - Accounts; stores are users with the `STORE` role
//! - `menu_items` - Menus owned by a store
//! - `foods` / `tags` / `food_tags` - Dishes and their tags
//! - `payment_methods` - Accepted payment methods
//! - `orders` / `order_details` - Orders and their line items
//! - `comments` / `likes` / `ratings` - User interactions with dishes
//! - `subscriptions` - Users following stores
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p foodloc-cli -- migrate
//! ```

pub mod foods;
pub mod interactions;
pub mod menu_items;
pub mod orders;
pub mod payment_methods;
pub mod stats;
pub mod subscriptions;
pub mod tags;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use foods::{FoodFilter, FoodOrdering, FoodRecord, FoodRepository, OrderableFood};
pub use interactions::InteractionRepository;
pub use menu_items::MenuItemRepository;
pub use orders::{OrderRepository, OrderScope};
pub use payment_methods::PaymentMethodRepository;
pub use stats::{RevenuePeriod, StatsRepository};
pub use subscriptions::SubscriptionRepository;
pub use tags::TagRepository;
pub use users::{ProfileChanges, UserRecord, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (unique key, or a row still referenced elsewhere).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A write pointed at a row that does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

/// Translate constraint violations on inserts and updates.
///
/// `what` names the entity in the message: a duplicate `"username"` yields
/// `Conflict("username already exists")`, a dangling `"menu item"` yields
/// `MissingReference("menu item does not exist")`.
pub(crate) fn map_write_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::MissingReference(format!("{what} does not exist"));
        }
    }
    RepositoryError::Database(e)
}

/// Translate a foreign key violation on delete into `Conflict`.
pub(crate) fn map_delete_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict(format!("{what} is referenced by other records"));
    }
    RepositoryError::Database(e)
}

/// Escape `%`, `_` and `\` so user input can be embedded in an `ILIKE` pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("pho"), "%pho%");
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_write_error(sqlx::Error::RowNotFound, "tag");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));

        let err = map_delete_error(sqlx::Error::RowNotFound, "food");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }
}
