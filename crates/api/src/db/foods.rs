//! Dish repository.
//!
//! Listing builds its `WHERE` clause dynamically with [`sqlx::QueryBuilder`]
//! so every filter stays a bound parameter.

use chrono::NaiveTime;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use foodloc_core::{FoodId, MenuItemId, Money, TagId, UserId};

use super::{RepositoryError, like_pattern, map_delete_error, map_write_error};
use crate::models::food::{Food, FoodWithMenu};

const FOOD_COLUMNS: &str = "f.id, f.name, f.price, f.active, f.start_time, f.end_time, \
     f.description, f.content, f.image_food, f.menu_item_id, f.created_date, f.updated_date";

/// Whether the owning store (`u`) may show its dishes publicly.
const STORE_LISTED: &str = "(u.is_active AND u.is_verify) AS store_listed";

/// Sort order for dish listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoodOrdering {
    /// Newest first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl FoodOrdering {
    /// Parse the `ordering` query parameter.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "-created" | "-created_date" => Some(Self::Newest),
            "price" => Some(Self::PriceAsc),
            "-price" => Some(Self::PriceDesc),
            "name" => Some(Self::NameAsc),
            _ => None,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY f.created_date DESC, f.id DESC",
            Self::PriceAsc => " ORDER BY f.price ASC, f.id ASC",
            Self::PriceDesc => " ORDER BY f.price DESC, f.id DESC",
            Self::NameAsc => " ORDER BY lower(f.name) ASC, f.id ASC",
        }
    }
}

/// Filters for dish listings. Empty filter lists every visible dish.
#[derive(Debug, Clone, Default)]
pub struct FoodFilter {
    /// Substring of the dish name.
    pub q: Option<String>,
    pub tag: Option<TagId>,
    pub store: Option<UserId>,
    pub menu_item: Option<MenuItemId>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Only dishes whose service window contains this local time.
    pub available_at: Option<NaiveTime>,
    /// Staff view: include disabled dishes and menus and unlisted stores.
    pub include_inactive: bool,
}

/// A dish row locked for pricing an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderableFood {
    #[sqlx(flatten)]
    pub food: Food,
    pub menu_active: bool,
    pub store_id: UserId,
}

/// Repository for dishes.
pub struct FoodRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FoodRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of dishes matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &FoodFilter,
        ordering: FoodOrdering,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FoodWithMenu>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {FOOD_COLUMNS}, m.name AS menu_name, m.active AS menu_active, m.store_id, \
             {STORE_LISTED} \
             FROM marketplace.foods f \
             JOIN marketplace.menu_items m ON m.id = f.menu_item_id \
             JOIN marketplace.users u ON u.id = m.store_id"
        ));
        push_filters(&mut qb, filter);
        qb.push(ordering.order_by());
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        let foods = qb
            .build_query_as::<FoodWithMenu>()
            .fetch_all(self.pool)
            .await?;
        Ok(foods)
    }

    /// Number of dishes matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &FoodFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM marketplace.foods f \
             JOIN marketplace.menu_items m ON m.id = f.menu_item_id \
             JOIN marketplace.users u ON u.id = m.store_id",
        );
        push_filters(&mut qb, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Get a dish with its menu, regardless of state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: FoodId) -> Result<Option<FoodWithMenu>, RepositoryError> {
        let food = sqlx::query_as::<_, FoodWithMenu>(&format!(
            r"
            SELECT {FOOD_COLUMNS}, m.name AS menu_name, m.active AS menu_active, m.store_id,
                {STORE_LISTED}
            FROM marketplace.foods f
            JOIN marketplace.menu_items m ON m.id = f.menu_item_id
            JOIN marketplace.users u ON u.id = m.store_id
            WHERE f.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(food)
    }

    /// Insert a dish on `conn`, typically inside the transaction that also
    /// attaches its tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the menu vanished concurrently.
    pub async fn insert(
        conn: &mut PgConnection,
        food: &FoodRecord,
    ) -> Result<Food, RepositoryError> {
        sqlx::query_as::<_, Food>(&format!(
            r"
            INSERT INTO marketplace.foods AS f
                (name, price, active, start_time, end_time, description, content,
                 image_food, menu_item_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {FOOD_COLUMNS}
            "
        ))
        .bind(&food.name)
        .bind(food.price)
        .bind(food.active)
        .bind(food.start_time)
        .bind(food.end_time)
        .bind(&food.description)
        .bind(&food.content)
        .bind(&food.image_food)
        .bind(food.menu_item_id)
        .fetch_one(conn)
        .await
        .map_err(|e| map_write_error(e, "menu item"))
    }

    /// Overwrite every editable column of a dish.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the dish does not exist.
    /// Returns `RepositoryError::MissingReference` if the menu does not exist.
    pub async fn update(&self, id: FoodId, food: &FoodRecord) -> Result<Food, RepositoryError> {
        sqlx::query_as::<_, Food>(&format!(
            r"
            UPDATE marketplace.foods AS f SET
                name = $2, price = $3, active = $4, start_time = $5, end_time = $6,
                description = $7, content = $8, image_food = $9, menu_item_id = $10,
                updated_date = NOW()
            WHERE f.id = $1
            RETURNING {FOOD_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&food.name)
        .bind(food.price)
        .bind(food.active)
        .bind(food.start_time)
        .bind(food.end_time)
        .bind(&food.description)
        .bind(&food.content)
        .bind(&food.image_food)
        .bind(food.menu_item_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_write_error(e, "menu item"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Enable or disable a dish.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the dish does not exist.
    pub async fn set_active(&self, id: FoodId, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE marketplace.foods SET active = $2, updated_date = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a dish.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the dish appears on an order.
    /// Returns `RepositoryError::NotFound` if the dish does not exist.
    pub async fn delete(&self, id: FoodId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM marketplace.foods WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error(e, "food"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Total number of dishes (admin dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM marketplace.foods")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Lock the given dishes and their menus for the rest of the transaction.
    ///
    /// `FOR SHARE` blocks concurrent price or state edits until the order is
    /// committed, so the snapshot prices stay consistent with what was checked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_order(
        conn: &mut PgConnection,
        ids: &[FoodId],
    ) -> Result<Vec<OrderableFood>, RepositoryError> {
        let foods = sqlx::query_as::<_, OrderableFood>(&format!(
            r"
            SELECT {FOOD_COLUMNS}, m.active AS menu_active, m.store_id
            FROM marketplace.foods f
            JOIN marketplace.menu_items m ON m.id = f.menu_item_id
            WHERE f.id = ANY($1)
            FOR SHARE OF f, m
            "
        ))
        .bind(ids)
        .fetch_all(conn)
        .await?;
        Ok(foods)
    }
}

/// Validated column values for inserting or replacing a dish.
#[derive(Debug, Clone)]
pub struct FoodRecord {
    pub name: String,
    pub price: Money,
    pub active: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_food: Option<String>,
    pub menu_item_id: MenuItemId,
}

impl From<&Food> for FoodRecord {
    fn from(food: &Food) -> Self {
        Self {
            name: food.name.clone(),
            price: food.price,
            active: food.active,
            start_time: food.start_time,
            end_time: food.end_time,
            description: food.description.clone(),
            content: food.content.clone(),
            image_food: food.image_food.clone(),
            menu_item_id: food.menu_item_id,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &FoodFilter) {
    if filter.include_inactive {
        qb.push(" WHERE TRUE");
    } else {
        qb.push(" WHERE u.is_active AND u.is_verify AND f.active AND m.active");
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        qb.push(" AND f.name ILIKE ").push_bind(like_pattern(q));
    }
    if let Some(tag) = filter.tag {
        qb.push(
            " AND EXISTS (SELECT 1 FROM marketplace.food_tags ft \
             WHERE ft.food_id = f.id AND ft.tag_id = ",
        )
        .push_bind(tag)
        .push(")");
    }
    if let Some(store) = filter.store {
        qb.push(" AND m.store_id = ").push_bind(store);
    }
    if let Some(menu) = filter.menu_item {
        qb.push(" AND f.menu_item_id = ").push_bind(menu);
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND f.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND f.price <= ").push_bind(max);
    }
    if let Some(at) = filter.available_at {
        // Same rule as ServiceWindow::contains: open bounds, inclusive ends,
        // start after end wraps midnight.
        qb.push(" AND (CASE WHEN f.start_time IS NULL AND f.end_time IS NULL THEN TRUE")
            .push(" WHEN f.end_time IS NULL THEN f.start_time <= ")
            .push_bind(at)
            .push(" WHEN f.start_time IS NULL THEN f.end_time >= ")
            .push_bind(at)
            .push(" WHEN f.start_time <= f.end_time THEN ")
            .push_bind(at)
            .push(" BETWEEN f.start_time AND f.end_time ELSE ")
            .push_bind(at)
            .push(" >= f.start_time OR ")
            .push_bind(at)
            .push(" <= f.end_time END)");
    }
}
