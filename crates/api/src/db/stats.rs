//! Revenue statistics for stores.
//!
//! Only completed (`SUCCESSED`) orders count. Orders are bucketed in the
//! marketplace's local time zone, which is passed in as a minute offset.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use foodloc_core::{FoodId, UserId};

use super::RepositoryError;

/// Bucket size for revenue series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevenuePeriod {
    #[default]
    Month,
    Quarter,
    Year,
}

impl RevenuePeriod {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// Field name understood by `date_trunc`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RevenueBucket {
    /// First local day of the bucket.
    pub period_start: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FoodRevenue {
    pub food_id: FoodId,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Completed-order count and revenue per period, oldest bucket first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue(
        &self,
        store: UserId,
        period: RevenuePeriod,
        year: Option<i32>,
        utc_offset_minutes: i32,
    ) -> Result<Vec<RevenueBucket>, RepositoryError> {
        let buckets = sqlx::query_as::<_, RevenueBucket>(
            r"
            WITH local_orders AS (
                SELECT o.amount,
                       (o.created_date AT TIME ZONE 'UTC') + make_interval(mins => $4) AS local_ts
                FROM marketplace.orders o
                WHERE o.store_id = $1 AND o.order_status = 'SUCCESSED'
            )
            SELECT date_trunc($2, local_ts)::date AS period_start,
                   COUNT(*) AS orders,
                   COALESCE(SUM(amount), 0) AS revenue
            FROM local_orders
            WHERE $3::int IS NULL OR EXTRACT(YEAR FROM local_ts)::int = $3
            GROUP BY 1
            ORDER BY 1
            ",
        )
        .bind(store)
        .bind(period.as_str())
        .bind(year)
        .bind(utc_offset_minutes)
        .fetch_all(self.pool)
        .await?;
        Ok(buckets)
    }

    /// Units sold and revenue per dish, best sellers first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_by_food(
        &self,
        store: UserId,
        year: Option<i32>,
        utc_offset_minutes: i32,
    ) -> Result<Vec<FoodRevenue>, RepositoryError> {
        let rows = sqlx::query_as::<_, FoodRevenue>(
            r"
            SELECT f.id AS food_id, f.name,
                   SUM(d.quantity)::bigint AS quantity,
                   SUM(d.unit_price * d.quantity) AS revenue
            FROM marketplace.order_details d
            JOIN marketplace.orders o ON o.id = d.order_id
            JOIN marketplace.foods f ON f.id = d.food_id
            WHERE o.store_id = $1 AND o.order_status = 'SUCCESSED'
              AND ($2::int IS NULL OR EXTRACT(YEAR FROM
                    (o.created_date AT TIME ZONE 'UTC') + make_interval(mins => $3))::int = $2)
            GROUP BY f.id, f.name
            ORDER BY revenue DESC, f.id
            ",
        )
        .bind(store)
        .bind(year)
        .bind(utc_offset_minutes)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Revenue of all completed orders (admin dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_revenue(&self) -> Result<Decimal, RepositoryError> {
        let total: Decimal = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(amount), 0) FROM marketplace.orders
            WHERE order_status = 'SUCCESSED'
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse() {
        assert_eq!(RevenuePeriod::parse("Quarter"), Some(RevenuePeriod::Quarter));
        assert_eq!(RevenuePeriod::parse("week"), None);
        assert_eq!(RevenuePeriod::default().as_str(), "month");
    }
}
