//! Order repository.
//!
//! Inserts run on a caller-supplied connection so that the order, its line
//! items and the dish locks share one transaction (see
//! [`crate::services::orders::OrderService`]).

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use foodloc_core::{FoodId, Money, OrderId, OrderStatus, PaymentMethodId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderDetail, OrderDetailWithFood};

const ORDER_COLUMNS: &str = "o.id, o.created_date, o.updated_date, o.amount, o.delivery_fee, \
     o.order_status, o.receiver_name, o.receiver_phone, o.receiver_address, o.payment_date, \
     o.payment_status, o.paymentmethod_id, o.user_id, o.store_id";

/// Which orders a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders placed by this user.
    Buyer(UserId),
    /// Orders received by this store.
    Store(UserId),
    /// Every order (staff).
    All,
}

impl OrderScope {
    const fn binds(self) -> (Option<UserId>, Option<UserId>) {
        match self {
            Self::Buyer(id) => (Some(id), None),
            Self::Store(id) => (None, Some(id)),
            Self::All => (None, None),
        }
    }
}

/// Column values for a new order row.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub user_id: UserId,
    pub store_id: UserId,
    pub paymentmethod_id: PaymentMethodId,
    pub amount: Money,
    pub delivery_fee: Money,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
}

/// Column values for a new line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRecord {
    pub food_id: FoodId,
    pub unit_price: Money,
    pub quantity: i32,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a `PENDING` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        conn: &mut PgConnection,
        order: &OrderRecord,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO marketplace.orders AS o
                (user_id, store_id, paymentmethod_id, amount, delivery_fee,
                 receiver_name, receiver_phone, receiver_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(order.store_id)
        .bind(order.paymentmethod_id)
        .bind(order.amount)
        .bind(order.delivery_fee)
        .bind(&order.receiver_name)
        .bind(&order.receiver_phone)
        .bind(&order.receiver_address)
        .fetch_one(conn)
        .await?;
        Ok(order)
    }

    /// Insert all line items of an order in one statement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_details(
        conn: &mut PgConnection,
        order_id: OrderId,
        details: &[DetailRecord],
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        let food_ids: Vec<FoodId> = details.iter().map(|d| d.food_id).collect();
        let prices: Vec<Decimal> = details.iter().map(|d| d.unit_price.amount()).collect();
        let quantities: Vec<i32> = details.iter().map(|d| d.quantity).collect();

        let rows = sqlx::query_as::<_, OrderDetail>(
            r"
            INSERT INTO marketplace.order_details (order_id, food_id, unit_price, quantity)
            SELECT $1, d.food_id, d.unit_price, d.quantity
            FROM UNNEST($2::int4[], $3::numeric[], $4::int4[]) AS d(food_id, unit_price, quantity)
            RETURNING id, order_id, food_id, unit_price, quantity
            ",
        )
        .bind(order_id)
        .bind(&food_ids)
        .bind(&prices)
        .bind(&quantities)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM marketplace.orders o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// One page of orders in `scope`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: OrderScope,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let (buyer, store) = scope.binds();
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM marketplace.orders o
            WHERE ($1::int IS NULL OR o.user_id = $1)
              AND ($2::int IS NULL OR o.store_id = $2)
              AND ($3::marketplace.order_status IS NULL OR o.order_status = $3)
            ORDER BY o.created_date DESC, o.id DESC
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(buyer)
        .bind(store)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Number of orders matched by [`Self::list`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(
        &self,
        scope: OrderScope,
        status: Option<OrderStatus>,
    ) -> Result<i64, RepositoryError> {
        let (buyer, store) = scope.binds();
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM marketplace.orders o
            WHERE ($1::int IS NULL OR o.user_id = $1)
              AND ($2::int IS NULL OR o.store_id = $2)
              AND ($3::marketplace.order_status IS NULL OR o.order_status = $3)
            ",
        )
        .bind(buyer)
        .bind(store)
        .bind(status)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Line items of the given orders with their dish names and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn details_for(
        &self,
        orders: &[OrderId],
    ) -> Result<Vec<OrderDetailWithFood>, RepositoryError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let details = sqlx::query_as::<_, OrderDetailWithFood>(
            r"
            SELECT d.id, d.order_id, d.food_id, d.unit_price, d.quantity,
                   f.name AS food_name, f.image_food AS food_image
            FROM marketplace.order_details d
            JOIN marketplace.foods f ON f.id = d.food_id
            WHERE d.order_id = ANY($1)
            ORDER BY d.order_id, d.id
            ",
        )
        .bind(orders)
        .fetch_all(self.pool)
        .await?;
        Ok(details)
    }

    /// Move an order from `from` to `to` if it is still in `from`.
    ///
    /// Returns `None` when the order is missing or another request changed its
    /// status first. When `mark_paid` is set the order is also flagged paid
    /// and keeps any payment date it already had.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn advance_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        mark_paid: bool,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE marketplace.orders AS o SET
                order_status = $3,
                payment_status = o.payment_status OR $4,
                payment_date = CASE WHEN $4 THEN COALESCE(o.payment_date, NOW())
                                    ELSE o.payment_date END,
                updated_date = NOW()
            WHERE o.id = $1 AND o.order_status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(mark_paid)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Order counts per status (admin dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows: Vec<(OrderStatus, i64)> = sqlx::query_as(
            r"
            SELECT order_status, COUNT(*) FROM marketplace.orders
            GROUP BY order_status ORDER BY order_status
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_binds() {
        let id = UserId::new(9);
        assert_eq!(OrderScope::Buyer(id).binds(), (Some(id), None));
        assert_eq!(OrderScope::Store(id).binds(), (None, Some(id)));
        assert_eq!(OrderScope::All.binds(), (None, None));
    }
}
