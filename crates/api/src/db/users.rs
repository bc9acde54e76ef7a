//! User repository for database operations.
//!
//! Accounts, store listings and the staff-only account switches used by the
//! admin console.

use sqlx::PgPool;

use foodloc_core::{UserId, UserRole};

use super::{RepositoryError, like_pattern, map_write_error};
use crate::models::user::{StoreWithCount, User};

const USER_COLUMNS: &str = "u.id, u.username, u.first_name, u.last_name, u.email, u.phone, \
     u.avatar, u.name_store, u.address, u.user_role, u.is_verify, u.is_active, u.is_staff, \
     u.is_superuser, u.date_joined";

/// Validated values for a new account row.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub name_store: Option<String>,
    pub address: Option<String>,
    pub user_role: UserRole,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Validated partial profile changes. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub name_store: Option<String>,
    pub address: Option<String>,
    /// Replacement Argon2 hash.
    pub password_hash: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM marketplace.users u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get several users at once, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM marketplace.users u WHERE u.id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// Get a user and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: User,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, Row>(&format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM marketplace.users u WHERE u.username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create an account.
    ///
    /// Stores start unverified; the admin console verifies them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        record: &UserRecord,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO marketplace.users AS u
                (username, password_hash, first_name, last_name, email, phone, avatar,
                 name_store, address, user_role, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&record.username)
        .bind(password_hash)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.avatar)
        .bind(&record.name_store)
        .bind(&record.address)
        .bind(record.user_role)
        .bind(record.is_staff)
        .bind(record.is_superuser)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "username"))
    }

    /// Apply profile changes, including a new password hash, in one statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE marketplace.users AS u SET
                first_name = COALESCE($2, u.first_name),
                last_name = COALESCE($3, u.last_name),
                email = COALESCE($4, u.email),
                phone = COALESCE($5, u.phone),
                avatar = COALESCE($6, u.avatar),
                name_store = COALESCE($7, u.name_store),
                address = COALESCE($8, u.address),
                password_hash = COALESCE($9, u.password_hash)
            WHERE u.id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.avatar)
        .bind(&changes.name_store)
        .bind(&changes.address)
        .bind(&changes.password_hash)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Active verified stores, optionally filtered by store name or address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_stores(
        &self,
        q: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoreWithCount>, RepositoryError> {
        let stores = sqlx::query_as::<_, StoreWithCount>(&format!(
            r"
            SELECT {USER_COLUMNS},
                   (SELECT COUNT(*) FROM marketplace.menu_items m
                    WHERE m.store_id = u.id AND m.active) AS menu_count
            FROM marketplace.users u
            WHERE u.user_role = 'STORE' AND u.is_verify AND u.is_active
              AND ($1::text IS NULL OR u.name_store ILIKE $1 OR u.address ILIKE $1)
            ORDER BY u.id
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(q.map(like_pattern))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(stores)
    }

    /// Count of stores matched by [`Self::list_stores`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_stores(&self, q: Option<&str>) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM marketplace.users u
            WHERE u.user_role = 'STORE' AND u.is_verify AND u.is_active
              AND ($1::text IS NULL OR u.name_store ILIKE $1 OR u.address ILIKE $1)
            ",
        )
        .bind(q.map(like_pattern))
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// A single publicly visible store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_store(&self, id: UserId) -> Result<Option<StoreWithCount>, RepositoryError> {
        let store = sqlx::query_as::<_, StoreWithCount>(&format!(
            r"
            SELECT {USER_COLUMNS},
                   (SELECT COUNT(*) FROM marketplace.menu_items m
                    WHERE m.store_id = u.id AND m.active) AS menu_count
            FROM marketplace.users u
            WHERE u.id = $1 AND u.user_role = 'STORE' AND u.is_verify AND u.is_active
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(store)
    }

    // =========================================================================
    // Staff operations
    // =========================================================================

    /// All accounts matching `q` on username, email or store name, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        q: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r"
            SELECT {USER_COLUMNS} FROM marketplace.users u
            WHERE $1::text IS NULL OR u.username ILIKE $1 OR u.email ILIKE $1
               OR u.name_store ILIKE $1
            ORDER BY u.date_joined DESC, u.id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(q.map(like_pattern))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// Stores waiting for verification, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_unverified_stores(&self, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r"
            SELECT {USER_COLUMNS} FROM marketplace.users u
            WHERE u.user_role = 'STORE' AND NOT u.is_verify AND u.is_active
            ORDER BY u.date_joined
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// Enable or disable an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_active(&self, id: UserId, active: bool) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE marketplace.users AS u SET is_active = $2 WHERE u.id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Set the verification flag of a store account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no store has this id.
    pub async fn set_verified(&self, id: UserId, verified: bool) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE marketplace.users AS u SET is_verify = $2
            WHERE u.id = $1 AND u.user_role = 'STORE'
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(verified)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Account totals for the admin dashboard: (users, stores, unverified stores).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<(i64, i64, i64), RepositoryError> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r"
            SELECT COUNT(*) FILTER (WHERE user_role = 'USER'),
                   COUNT(*) FILTER (WHERE user_role = 'STORE'),
                   COUNT(*) FILTER (WHERE user_role = 'STORE' AND NOT is_verify)
            FROM marketplace.users
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }
}
