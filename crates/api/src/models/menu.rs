//! Store menus.

use chrono::{DateTime, Utc};

use foodloc_core::{MenuItemId, UserId};

/// A named group of dishes owned by one store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub active: bool,
    pub store_id: UserId,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// A menu with the number of active dishes on it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MenuItemWithCount {
    #[sqlx(flatten)]
    pub menu: MenuItem,
    pub food_count: i64,
}
