//! Menu repository.

use sqlx::PgPool;

use foodloc_core::{MenuItemId, UserId};

use super::{RepositoryError, map_delete_error, map_write_error};
use crate::models::menu::{MenuItem, MenuItemWithCount};

const MENU_COLUMNS: &str = "m.id, m.name, m.active, m.store_id, m.created_date, m.updated_date";

/// Repository for store menus.
pub struct MenuItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MenuItemRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Menus of active verified stores, with their active dish counts.
    ///
    /// `include_inactive` also returns disabled menus; it is only set when the
    /// owning store lists its own menus.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        store: Option<UserId>,
        include_inactive: bool,
    ) -> Result<Vec<MenuItemWithCount>, RepositoryError> {
        let menus = sqlx::query_as::<_, MenuItemWithCount>(&format!(
            r"
            SELECT {MENU_COLUMNS},
                   (SELECT COUNT(*) FROM marketplace.foods f
                    WHERE f.menu_item_id = m.id AND f.active) AS food_count
            FROM marketplace.menu_items m
            JOIN marketplace.users u ON u.id = m.store_id
            WHERE u.is_active AND u.is_verify
              AND ($1::int IS NULL OR m.store_id = $1)
              AND ($2 OR m.active)
            ORDER BY m.store_id, m.name, m.id
            "
        ))
        .bind(store)
        .bind(include_inactive)
        .fetch_all(self.pool)
        .await?;
        Ok(menus)
    }

    /// Get a menu by id regardless of its state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: MenuItemId) -> Result<Option<MenuItemWithCount>, RepositoryError> {
        let menu = sqlx::query_as::<_, MenuItemWithCount>(&format!(
            r"
            SELECT {MENU_COLUMNS},
                   (SELECT COUNT(*) FROM marketplace.foods f
                    WHERE f.menu_item_id = m.id AND f.active) AS food_count
            FROM marketplace.menu_items m
            WHERE m.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(menu)
    }

    /// Create a menu for `store`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the store does not exist.
    pub async fn create(
        &self,
        store: UserId,
        name: &str,
        active: bool,
    ) -> Result<MenuItem, RepositoryError> {
        sqlx::query_as::<_, MenuItem>(&format!(
            r"
            INSERT INTO marketplace.menu_items AS m (name, active, store_id)
            VALUES ($1, $2, $3)
            RETURNING {MENU_COLUMNS}
            "
        ))
        .bind(name)
        .bind(active)
        .bind(store)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "store"))
    }

    /// Rename and/or toggle a menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the menu does not exist.
    pub async fn update(
        &self,
        id: MenuItemId,
        name: Option<&str>,
        active: Option<bool>,
    ) -> Result<MenuItem, RepositoryError> {
        sqlx::query_as::<_, MenuItem>(&format!(
            r"
            UPDATE marketplace.menu_items AS m SET
                name = COALESCE($2, m.name),
                active = COALESCE($3, m.active),
                updated_date = NOW()
            WHERE m.id = $1
            RETURNING {MENU_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .bind(active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a menu and its dishes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any of its dishes was ordered.
    /// Returns `RepositoryError::NotFound` if the menu does not exist.
    pub async fn delete(&self, id: MenuItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM marketplace.menu_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error(e, "menu item"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
