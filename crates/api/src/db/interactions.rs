//! Comments, likes and ratings on dishes.

use sqlx::PgPool;

use foodloc_core::{CommentId, FoodId, Rate, UserId};

use super::{RepositoryError, map_write_error};
use crate::models::interaction::Comment;

const COMMENT_COLUMNS: &str = "id, content, user_id, food_id, created_date, updated_date";

pub struct InteractionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InteractionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Comments on a dish, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_comments(
        &self,
        food: FoodId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r"
            SELECT {COMMENT_COLUMNS} FROM marketplace.comments
            WHERE food_id = $1
            ORDER BY created_date DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(food)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(comments)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_comments(&self, food: FoodId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM marketplace.comments WHERE food_id = $1")
                .bind(food)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM marketplace.comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(comment)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the dish was deleted concurrently.
    pub async fn create_comment(
        &self,
        user: UserId,
        food: FoodId,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        sqlx::query_as::<_, Comment>(&format!(
            r"
            INSERT INTO marketplace.comments (user_id, food_id, content)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(user)
        .bind(food)
        .bind(content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "food"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn update_comment(
        &self,
        id: CommentId,
        content: &str,
    ) -> Result<Comment, RepositoryError> {
        sqlx::query_as::<_, Comment>(&format!(
            r"
            UPDATE marketplace.comments SET content = $2, updated_date = NOW()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn delete_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM marketplace.comments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip the user's like on a dish and return the new state.
    ///
    /// The first call creates the like.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the dish does not exist.
    pub async fn toggle_like(&self, user: UserId, food: FoodId) -> Result<bool, RepositoryError> {
        let liked: bool = sqlx::query_scalar(
            r"
            INSERT INTO marketplace.likes AS l (user_id, food_id, liked)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (user_id, food_id)
            DO UPDATE SET liked = NOT l.liked, updated_date = NOW()
            RETURNING liked
            ",
        )
        .bind(user)
        .bind(food)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "food"))?;
        Ok(liked)
    }

    /// Set the user's rating of a dish, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` if the dish does not exist.
    pub async fn rate(&self, user: UserId, food: FoodId, rate: Rate) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO marketplace.ratings (user_id, food_id, rate)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, food_id)
            DO UPDATE SET rate = EXCLUDED.rate, updated_date = NOW()
            ",
        )
        .bind(user)
        .bind(food)
        .bind(rate.value())
        .execute(self.pool)
        .await
        .map_err(|e| map_write_error(e, "food"))?;
        Ok(())
    }

    /// The user's like state and rating for a dish.
    ///
    /// Defaults to not liked and a rate of 0 when the user never interacted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn viewer_state(
        &self,
        user: UserId,
        food: FoodId,
    ) -> Result<(bool, i16), RepositoryError> {
        let row: (bool, i16) = sqlx::query_as(
            r"
            SELECT
                COALESCE((SELECT liked FROM marketplace.likes
                          WHERE user_id = $1 AND food_id = $2), FALSE),
                COALESCE((SELECT rate FROM marketplace.ratings
                          WHERE user_id = $1 AND food_id = $2), 0::smallint)
            ",
        )
        .bind(user)
        .bind(food)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Public aggregates for a dish: (like count, average rating, rating count).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn food_stats(
        &self,
        food: FoodId,
    ) -> Result<(i64, Option<f64>, i64), RepositoryError> {
        let row: (i64, Option<f64>, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM marketplace.likes WHERE food_id = $1 AND liked),
                (SELECT AVG(rate)::float8 FROM marketplace.ratings WHERE food_id = $1),
                (SELECT COUNT(*) FROM marketplace.ratings WHERE food_id = $1)
            ",
        )
        .bind(food)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }
}
