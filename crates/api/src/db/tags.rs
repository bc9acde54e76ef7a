//! Tag repository.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use foodloc_core::{FoodId, TagId};

use super::{RepositoryError, map_write_error};
use crate::models::catalog::Tag;

pub struct TagRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All tags by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Tag>, RepositoryError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM marketplace.tags ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(tags)
    }

    /// Create a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, name: &str) -> Result<Tag, RepositoryError> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO marketplace.tags (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "tag"))
    }

    /// Create any missing tags from `names` and return all of them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, names: &[String]) -> Result<Vec<Tag>, RepositoryError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query(
            r"
            INSERT INTO marketplace.tags (name)
            SELECT unnest($1::text[])
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(names)
        .execute(self.pool)
        .await?;

        let tags = sqlx::query_as::<_, Tag>(
            "SELECT id, name FROM marketplace.tags WHERE name = ANY($1) ORDER BY name",
        )
        .bind(names)
        .fetch_all(self.pool)
        .await?;
        Ok(tags)
    }

    /// Attach tags to a dish. Already attached tags are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if a tag id does not exist.
    pub async fn attach(
        conn: &mut PgConnection,
        food: FoodId,
        tags: &[TagId],
    ) -> Result<(), RepositoryError> {
        if tags.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r"
            INSERT INTO marketplace.food_tags (food_id, tag_id)
            SELECT $1, unnest($2::int4[])
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(food)
        .bind(tags)
        .execute(conn)
        .await
        .map_err(|e| map_write_error(e, "tag"))?;
        Ok(())
    }

    /// Tags of each dish in `foods`. Dishes without tags are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_foods(
        &self,
        foods: &[FoodId],
    ) -> Result<HashMap<FoodId, Vec<Tag>>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            food_id: FoodId,
            #[sqlx(flatten)]
            tag: Tag,
        }

        if foods.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, Row>(
            r"
            SELECT ft.food_id, t.id, t.name
            FROM marketplace.food_tags ft
            JOIN marketplace.tags t ON t.id = ft.tag_id
            WHERE ft.food_id = ANY($1)
            ORDER BY t.name
            ",
        )
        .bind(foods)
        .fetch_all(self.pool)
        .await?;

        let mut by_food: HashMap<FoodId, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_food.entry(row.food_id).or_default().push(row.tag);
        }
        Ok(by_food)
    }
}
