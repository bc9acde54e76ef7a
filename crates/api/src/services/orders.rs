//! Order placement and lifecycle.
//!
//! Placement validates the request, then prices every line against locked
//! dish rows and writes the order and its line items in one transaction.
//! Status changes are compare-and-set updates: of two concurrent requests on
//! the same order, only one applies.

use std::collections::{HashMap, HashSet};

use chrono::NaiveTime;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use foodloc_core::{
    FoodId, Money, MoneyError, OrderId, OrderStatus, PaymentMethodId, TransitionError, UserId,
};

use crate::db::foods::{FoodRepository, OrderableFood};
use crate::db::orders::{DetailRecord, OrderRecord, OrderRepository};
use crate::db::{PaymentMethodRepository, RepositoryError, UserRepository};
use crate::models::order::{Order, OrderDetail};
use crate::models::user::User;
use crate::permissions;
use crate::validation::{self, MAX_NAME_LENGTH};

/// Errors from placing or advancing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("only customer accounts can place orders")]
    NotCustomer,

    #[error("{0}")]
    Invalid(String),

    #[error("order must contain at least one item")]
    EmptyOrder,

    #[error("food {0} appears more than once in the order")]
    DuplicateFood(FoodId),

    #[error("quantity for food {0} must be at least 1")]
    InvalidQuantity(FoodId),

    #[error("food {0} does not exist")]
    FoodNotFound(FoodId),

    #[error("food {0} is not available right now")]
    FoodUnavailable(FoodId),

    #[error("food {food} does not belong to store {store}")]
    WrongStore { food: FoodId, store: UserId },

    #[error("store {0} is not accepting orders")]
    StoreUnavailable(UserId),

    #[error("payment method {0} is not available")]
    PaymentMethodUnavailable(PaymentMethodId),

    #[error("invalid amount: {0}")]
    Money(#[from] MoneyError),

    #[error("order not found")]
    NotFound,

    #[error("only the store that received this order can change its status")]
    NotOrderStore,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("order status was changed by another request")]
    Conflict,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One requested line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderLine {
    pub food: FoodId,
    pub quantity: i32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub store: UserId,
    pub paymentmethod: PaymentMethodId,
    #[serde(default)]
    pub delivery_fee: Money,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    #[serde(default)]
    pub order_details: Vec<OrderLine>,
}

/// Line items priced at the current dish prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    /// Sum of line totals, delivery fee excluded.
    pub amount: Money,
    pub details: Vec<DetailRecord>,
}

/// Check the shape of the requested lines before touching the database.
///
/// # Errors
///
/// Returns `EmptyOrder`, `InvalidQuantity` or `DuplicateFood`.
pub fn check_lines(lines: &[OrderLine]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyOrder);
    }
    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity < 1 {
            return Err(OrderError::InvalidQuantity(line.food));
        }
        if !seen.insert(line.food) {
            return Err(OrderError::DuplicateFood(line.food));
        }
    }
    Ok(())
}

/// Price every line against the dish rows read for this order.
///
/// Each dish must exist, be active on an active menu, be inside its service
/// window at local time `now`, and belong to `store`. Unit prices are the
/// dish prices at this moment.
///
/// # Errors
///
/// Returns the first failing rule as an `OrderError`.
pub fn price_order(
    store: UserId,
    lines: &[OrderLine],
    foods: &[OrderableFood],
    now: NaiveTime,
) -> Result<PricedOrder, OrderError> {
    check_lines(lines)?;

    let by_id: HashMap<FoodId, &OrderableFood> = foods.iter().map(|f| (f.food.id, f)).collect();

    let mut amount = Money::ZERO;
    let mut details = Vec::with_capacity(lines.len());
    for line in lines {
        let row = by_id
            .get(&line.food)
            .ok_or(OrderError::FoodNotFound(line.food))?;
        if row.store_id != store {
            return Err(OrderError::WrongStore {
                food: line.food,
                store,
            });
        }
        if !row.menu_active || !row.food.is_orderable_at(now) {
            return Err(OrderError::FoodUnavailable(line.food));
        }

        let unit_price = row.food.price;
        amount = amount.checked_add(unit_price.line_total(line.quantity)?)?;
        details.push(DetailRecord {
            food_id: line.food,
            unit_price,
            quantity: line.quantity,
        });
    }

    Ok(PricedOrder { amount, details })
}

/// Validated receiver fields.
fn receiver(request: &PlaceOrder) -> Result<(String, String, String), OrderError> {
    let name = validation::required_text("receiver_name", &request.receiver_name, MAX_NAME_LENGTH)
        .map_err(OrderError::Invalid)?;
    let phone = validation::phone(&request.receiver_phone)
        .map_err(|e| OrderError::Invalid(format!("receiver_{e}")))?;
    let address = validation::required_text(
        "receiver_address",
        &request.receiver_address,
        MAX_NAME_LENGTH,
    )
    .map_err(OrderError::Invalid)?;
    Ok((name, phone, address))
}

/// Order placement and status changes.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for `buyer`.
    ///
    /// `now` is the marketplace's local time, used for dish service windows.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` for any validation failure; nothing is written
    /// unless every line is valid.
    pub async fn place_order(
        &self,
        buyer: &User,
        request: &PlaceOrder,
        now: NaiveTime,
    ) -> Result<(Order, Vec<OrderDetail>), OrderError> {
        permissions::require_customer(buyer).map_err(|_| OrderError::NotCustomer)?;
        let (receiver_name, receiver_phone, receiver_address) = receiver(request)?;
        check_lines(&request.order_details)?;

        let store = UserRepository::new(self.pool)
            .get_store(request.store)
            .await?
            .ok_or(OrderError::StoreUnavailable(request.store))?;
        let payment = PaymentMethodRepository::new(self.pool)
            .get(request.paymentmethod)
            .await?
            .filter(|p| p.active)
            .ok_or(OrderError::PaymentMethodUnavailable(request.paymentmethod))?;

        let food_ids: Vec<FoodId> = request.order_details.iter().map(|l| l.food).collect();

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let foods = FoodRepository::lock_for_order(&mut *tx, &food_ids).await?;
        let priced = price_order(store.store.id, &request.order_details, &foods, now)?;

        let order = OrderRepository::insert(
            &mut *tx,
            &OrderRecord {
                user_id: buyer.id,
                store_id: store.store.id,
                paymentmethod_id: payment.id,
                amount: priced.amount,
                delivery_fee: request.delivery_fee,
                receiver_name,
                receiver_phone,
                receiver_address,
            },
        )
        .await?;
        let details = OrderRepository::insert_details(&mut *tx, order.id, &priced.details).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            order_id = %order.id,
            user_id = %buyer.id,
            store_id = %order.store_id,
            amount = %order.amount,
            lines = details.len(),
            "Order placed"
        );

        Ok((order, details))
    }

    /// `PENDING → ACCEPTED`.
    ///
    /// # Errors
    ///
    /// See [`Self::advance`].
    pub async fn accept(&self, actor: &User, id: OrderId) -> Result<Order, OrderError> {
        self.advance(actor, id, OrderStatus::Accepted).await
    }

    /// `ACCEPTED → SUCCESSED`; also marks the order paid.
    ///
    /// # Errors
    ///
    /// See [`Self::advance`].
    pub async fn complete(&self, actor: &User, id: OrderId) -> Result<Order, OrderError> {
        self.advance(actor, id, OrderStatus::Succeeded).await
    }

    /// Move an order one step forward.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown orders, `NotOrderStore` unless `actor`
    /// is the order's store, `Transition` for an illegal step and `Conflict`
    /// if the status changed between the read and the write.
    pub async fn advance(
        &self,
        actor: &User,
        id: OrderId,
        to: OrderStatus,
    ) -> Result<Order, OrderError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders.get(id).await?.ok_or(OrderError::NotFound)?;

        if !actor.is_store() || order.store_id != actor.id {
            return Err(OrderError::NotOrderStore);
        }
        let from = order.order_status;
        from.transition(to)?;

        let mark_paid = to == OrderStatus::Succeeded;
        let updated = orders
            .advance_status(id, from, to, mark_paid)
            .await?
            .ok_or(OrderError::Conflict)?;

        tracing::info!(order_id = %id, %from, %to, "Order status changed");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::food::fixtures::food;

    const STORE: UserId = UserId::new(10);

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn orderable(id: i32, price: i64) -> OrderableFood {
        OrderableFood {
            food: food(id, price),
            menu_active: true,
            store_id: STORE,
        }
    }

    fn line(food: i32, quantity: i32) -> OrderLine {
        OrderLine {
            food: FoodId::new(food),
            quantity,
        }
    }

    fn vnd(n: i64) -> Money {
        Money::new(Decimal::from(n)).unwrap()
    }

    #[test]
    fn test_amount_is_sum_of_line_totals() {
        let foods = [orderable(1, 45_000), orderable(2, 15_000)];
        let priced = price_order(STORE, &[line(1, 2), line(2, 3)], &foods, noon()).unwrap();
        assert_eq!(priced.amount, vnd(135_000));
        assert_eq!(priced.details.len(), 2);
        assert_eq!(priced.details[0].unit_price, vnd(45_000));
        assert_eq!(priced.details[1].quantity, 3);
    }

    #[test]
    fn test_empty_order_rejected() {
        assert!(matches!(
            price_order(STORE, &[], &[], noon()),
            Err(OrderError::EmptyOrder)
        ));
    }

    #[test]
    fn test_duplicate_food_rejected() {
        let foods = [orderable(1, 45_000)];
        assert!(matches!(
            price_order(STORE, &[line(1, 1), line(1, 2)], &foods, noon()),
            Err(OrderError::DuplicateFood(id)) if id == FoodId::new(1)
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let foods = [orderable(1, 45_000)];
        for qty in [0, -1] {
            assert!(matches!(
                price_order(STORE, &[line(1, qty)], &foods, noon()),
                Err(OrderError::InvalidQuantity(_))
            ));
        }
    }

    #[test]
    fn test_unknown_food_rejected() {
        let foods = [orderable(1, 45_000)];
        assert!(matches!(
            price_order(STORE, &[line(1, 1), line(99, 1)], &foods, noon()),
            Err(OrderError::FoodNotFound(id)) if id == FoodId::new(99)
        ));
    }

    #[test]
    fn test_inactive_food_or_menu_rejected() {
        let mut inactive = orderable(1, 45_000);
        inactive.food.active = false;
        assert!(matches!(
            price_order(STORE, &[line(1, 1)], &[inactive], noon()),
            Err(OrderError::FoodUnavailable(_))
        ));

        let mut hidden_menu = orderable(2, 45_000);
        hidden_menu.menu_active = false;
        assert!(matches!(
            price_order(STORE, &[line(2, 1)], &[hidden_menu], noon()),
            Err(OrderError::FoodUnavailable(_))
        ));
    }

    #[test]
    fn test_food_outside_service_window_rejected() {
        let mut breakfast = orderable(1, 30_000);
        breakfast.food.start_time = NaiveTime::from_hms_opt(6, 0, 0);
        breakfast.food.end_time = NaiveTime::from_hms_opt(10, 0, 0);
        assert!(matches!(
            price_order(STORE, &[line(1, 1)], &[breakfast.clone()], noon()),
            Err(OrderError::FoodUnavailable(_))
        ));
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert!(price_order(STORE, &[line(1, 1)], &[breakfast], eight).is_ok());
    }

    #[test]
    fn test_food_from_other_store_rejected() {
        let mut foreign = orderable(1, 45_000);
        foreign.store_id = UserId::new(11);
        assert!(matches!(
            price_order(STORE, &[line(1, 1)], &[foreign], noon()),
            Err(OrderError::WrongStore { store, .. }) if store == STORE
        ));
    }

    #[test]
    fn test_amount_overflow_rejected() {
        let foods = [orderable(1, 9_000_000_000)];
        assert!(matches!(
            price_order(STORE, &[line(1, 2)], &foods, noon()),
            Err(OrderError::Money(MoneyError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_receiver_validation() {
        let mut request = PlaceOrder {
            store: STORE,
            paymentmethod: PaymentMethodId::new(1),
            delivery_fee: Money::ZERO,
            receiver_name: "  Lan ".to_string(),
            receiver_phone: "0901 234 567".to_string(),
            receiver_address: "12 Tran Hung Dao".to_string(),
            order_details: vec![line(1, 1)],
        };
        let (name, phone, _) = receiver(&request).unwrap();
        assert_eq!(name, "Lan");
        assert_eq!(phone, "0901234567");

        request.receiver_phone = "abc".to_string();
        assert!(matches!(receiver(&request), Err(OrderError::Invalid(_))));
    }

    #[test]
    fn test_place_order_body_defaults() {
        let body = r#"{
            "store": 10, "paymentmethod": 1,
            "receiver_name": "Lan", "receiver_phone": "0901234567",
            "receiver_address": "12 Tran Hung Dao",
            "order_details": [{"food": 1, "quantity": 2}]
        }"#;
        let request: PlaceOrder = serde_json::from_str(body).unwrap();
        assert_eq!(request.delivery_fee, Money::ZERO);
        assert_eq!(request.order_details, vec![line(1, 2)]);
        assert!(serde_json::from_str::<PlaceOrder>(&body.replace("10,", "10, \"delivery_fee\": \"-5\",")).is_err());
    }
}
