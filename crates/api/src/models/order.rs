//! Orders and their line items.

use chrono::{DateTime, Utc};

use foodloc_core::{
    FoodId, Money, OrderDetailId, OrderId, OrderStatus, PaymentMethodId, UserId,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    /// Sum of line totals, excluding the delivery fee.
    pub amount: Money,
    pub delivery_fee: Money,
    pub order_status: OrderStatus,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: bool,
    pub paymentmethod_id: PaymentMethodId,
    pub user_id: UserId,
    pub store_id: UserId,
}

impl Order {
    /// Whether `user` is the buyer or the store of this order.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.user_id == user || self.store_id == user
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub food_id: FoodId,
    /// Price of the dish when the order was placed.
    pub unit_price: Money,
    pub quantity: i32,
}

/// A line item with the current name and image of its dish.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDetailWithFood {
    #[sqlx(flatten)]
    pub detail: OrderDetail,
    pub food_name: String,
    pub food_image: Option<String>,
}
